//! Gate vocabulary and concrete gate instances.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{IrError, IrResult};
use crate::linalg::{self, Matrix};
use crate::matrices;
use crate::operator::{Capabilities, Generator, Operator};
use crate::pow::Exponent;
use crate::sparse::SparseMatrix;
use crate::wire::{Wire, Wires};

/// Tolerance for matching special exponent values in native power rules.
const POW_TOL: f64 = 1e-6;

/// The kinds of gate the facade knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum GateKind {
    // Non-parametric single-qubit gates
    /// Identity on one or more wires.
    Identity,
    /// Pauli-X gate.
    PauliX,
    /// Pauli-Y gate.
    PauliY,
    /// Pauli-Z gate.
    PauliZ,
    /// Hadamard gate.
    Hadamard,
    /// S gate (sqrt(Z)).
    S,
    /// T gate (fourth root of Z).
    T,
    /// sqrt(X) gate.
    SX,

    // Parametric single-qubit gates
    /// Rotation around X.
    RX,
    /// Rotation around Y.
    RY,
    /// Rotation around Z.
    RZ,
    /// Phase shift diag(1, e^{iφ}).
    PhaseShift,
    /// U1(λ), identical to a phase shift.
    U1,
    /// U2(φ, λ) = U3(π/2, φ, λ).
    U2,
    /// U3(θ, φ, λ).
    U3,
    /// Rot(φ, θ, ω) = RZ(ω) RY(θ) RZ(φ).
    Rot,

    // Two-qubit gates
    /// Controlled-NOT.
    CNOT,
    /// Controlled-Y.
    CY,
    /// Controlled-Z.
    CZ,
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// Square root of iSWAP.
    SISwap,
    /// Controlled phase shift.
    ControlledPhaseShift,
    /// Controlled RX.
    CRX,
    /// Controlled RY.
    CRY,
    /// Controlled RZ.
    CRZ,
    /// Controlled Rot.
    CRot,
    /// exp(-iφ/2 X⊗X).
    IsingXX,
    /// exp(-iφ/2 Y⊗Y).
    IsingYY,
    /// exp(-iφ/2 Z⊗Z).
    IsingZZ,

    // Multi-qubit gates
    /// exp(-iθ/2 Z⊗…⊗Z).
    MultiRZ,
    /// Toffoli (CCNOT).
    Toffoli,
    /// Controlled SWAP (Fredkin).
    CSwap,
    /// X on the last wire controlled on all others.
    MultiControlledX,
    /// Quantum Fourier transform.
    QFT,
    /// Arbitrary unitary given as a matrix.
    QubitUnitary,
    /// Ordering fence with no action.
    Barrier,

    // Kinds outside the commutation vocabulary
    /// exp(-iθ/2 P) for a Pauli word P.
    PauliRot,
    /// Hermitian observable given as a matrix.
    Hermitian,
    /// Density-matrix state preparation.
    QubitDensityMatrix,
    /// Computational basis state preparation.
    BasisState,
}

/// How many wires a gate kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireCount {
    /// Exactly this many.
    Fixed(usize),
    /// At least this many.
    AtLeast(usize),
}

/// Eigenbasis of the target action of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// Pauli-X eigenbasis.
    X,
    /// Pauli-Y eigenbasis.
    Y,
    /// Computational basis.
    Z,
}

impl GateKind {
    /// Canonical name of this gate kind.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::Identity => "Identity",
            GateKind::PauliX => "PauliX",
            GateKind::PauliY => "PauliY",
            GateKind::PauliZ => "PauliZ",
            GateKind::Hadamard => "Hadamard",
            GateKind::S => "S",
            GateKind::T => "T",
            GateKind::SX => "SX",
            GateKind::RX => "RX",
            GateKind::RY => "RY",
            GateKind::RZ => "RZ",
            GateKind::PhaseShift => "PhaseShift",
            GateKind::U1 => "U1",
            GateKind::U2 => "U2",
            GateKind::U3 => "U3",
            GateKind::Rot => "Rot",
            GateKind::CNOT => "CNOT",
            GateKind::CY => "CY",
            GateKind::CZ => "CZ",
            GateKind::Swap => "SWAP",
            GateKind::ISwap => "ISWAP",
            GateKind::SISwap => "SISWAP",
            GateKind::ControlledPhaseShift => "ControlledPhaseShift",
            GateKind::CRX => "CRX",
            GateKind::CRY => "CRY",
            GateKind::CRZ => "CRZ",
            GateKind::CRot => "CRot",
            GateKind::IsingXX => "IsingXX",
            GateKind::IsingYY => "IsingYY",
            GateKind::IsingZZ => "IsingZZ",
            GateKind::MultiRZ => "MultiRZ",
            GateKind::Toffoli => "Toffoli",
            GateKind::CSwap => "CSWAP",
            GateKind::MultiControlledX => "MultiControlledX",
            GateKind::QFT => "QFT",
            GateKind::QubitUnitary => "QubitUnitary",
            GateKind::Barrier => "Barrier",
            GateKind::PauliRot => "PauliRot",
            GateKind::Hermitian => "Hermitian",
            GateKind::QubitDensityMatrix => "QubitDensityMatrix",
            GateKind::BasisState => "BasisState",
        }
    }

    /// Number of wires this kind acts on.
    pub fn num_wires(&self) -> WireCount {
        match self {
            GateKind::PauliX
            | GateKind::PauliY
            | GateKind::PauliZ
            | GateKind::Hadamard
            | GateKind::S
            | GateKind::T
            | GateKind::SX
            | GateKind::RX
            | GateKind::RY
            | GateKind::RZ
            | GateKind::PhaseShift
            | GateKind::U1
            | GateKind::U2
            | GateKind::U3
            | GateKind::Rot => WireCount::Fixed(1),

            GateKind::CNOT
            | GateKind::CY
            | GateKind::CZ
            | GateKind::Swap
            | GateKind::ISwap
            | GateKind::SISwap
            | GateKind::ControlledPhaseShift
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::CRot
            | GateKind::IsingXX
            | GateKind::IsingYY
            | GateKind::IsingZZ => WireCount::Fixed(2),

            GateKind::Toffoli | GateKind::CSwap => WireCount::Fixed(3),

            GateKind::MultiControlledX => WireCount::AtLeast(2),

            GateKind::Identity
            | GateKind::MultiRZ
            | GateKind::QFT
            | GateKind::QubitUnitary
            | GateKind::Barrier
            | GateKind::PauliRot
            | GateKind::Hermitian
            | GateKind::QubitDensityMatrix
            | GateKind::BasisState => WireCount::AtLeast(1),
        }
    }

    /// Number of numeric parameters. `BasisState` takes one per wire and is
    /// reported as `None`.
    pub fn num_params(&self) -> Option<usize> {
        match self {
            GateKind::RX
            | GateKind::RY
            | GateKind::RZ
            | GateKind::PhaseShift
            | GateKind::U1
            | GateKind::ControlledPhaseShift
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::IsingXX
            | GateKind::IsingYY
            | GateKind::IsingZZ
            | GateKind::MultiRZ
            | GateKind::PauliRot => Some(1),
            GateKind::U2 => Some(2),
            GateKind::U3 | GateKind::Rot | GateKind::CRot => Some(3),
            GateKind::BasisState => None,
            _ => Some(0),
        }
    }

    /// Whether the kind describes something that acts on the state.
    pub fn is_operation(&self) -> bool {
        !matches!(self, GateKind::Hermitian)
    }

    /// Whether the kind can be measured.
    pub fn is_observable(&self) -> bool {
        matches!(
            self,
            GateKind::Identity
                | GateKind::PauliX
                | GateKind::PauliY
                | GateKind::PauliZ
                | GateKind::Hadamard
                | GateKind::Hermitian
        )
    }

    /// Whether a closed-form matrix exists.
    pub fn has_matrix(&self) -> bool {
        !matches!(
            self,
            GateKind::Barrier | GateKind::QubitDensityMatrix | GateKind::BasisState
        )
    }

    /// Whether instances carry an explicit matrix hyperparameter.
    pub fn takes_matrix(&self) -> bool {
        matches!(
            self,
            GateKind::QubitUnitary | GateKind::Hermitian | GateKind::QubitDensityMatrix
        )
    }

    /// Eigenbasis of the target action.
    pub fn basis(&self) -> Option<Basis> {
        match self {
            GateKind::PauliX
            | GateKind::SX
            | GateKind::RX
            | GateKind::CNOT
            | GateKind::CRX
            | GateKind::Toffoli
            | GateKind::MultiControlledX
            | GateKind::IsingXX => Some(Basis::X),
            GateKind::PauliY | GateKind::RY | GateKind::CY | GateKind::CRY | GateKind::IsingYY => {
                Some(Basis::Y)
            }
            GateKind::PauliZ
            | GateKind::S
            | GateKind::T
            | GateKind::RZ
            | GateKind::PhaseShift
            | GateKind::U1
            | GateKind::CZ
            | GateKind::CRZ
            | GateKind::ControlledPhaseShift
            | GateKind::IsingZZ
            | GateKind::MultiRZ => Some(Basis::Z),
            _ => None,
        }
    }

    /// Number of leading control wires for an instance on `num_wires` wires.
    pub fn num_control_wires(&self, num_wires: usize) -> usize {
        match self {
            GateKind::CNOT
            | GateKind::CY
            | GateKind::CZ
            | GateKind::ControlledPhaseShift
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::CRot
            | GateKind::CSwap => 1,
            GateKind::Toffoli => 2,
            GateKind::MultiControlledX => num_wires.saturating_sub(1),
            _ => 0,
        }
    }

    /// Short label used when drawing circuits.
    pub fn label(&self) -> &'static str {
        match self {
            GateKind::Identity => "I",
            GateKind::PauliX => "X",
            GateKind::PauliY => "Y",
            GateKind::PauliZ => "Z",
            GateKind::Hadamard => "H",
            GateKind::S => "S",
            GateKind::T => "T",
            GateKind::SX => "SX",
            GateKind::RX | GateKind::CRX => "RX",
            GateKind::RY | GateKind::CRY => "RY",
            GateKind::RZ | GateKind::CRZ => "RZ",
            GateKind::PhaseShift | GateKind::ControlledPhaseShift => "Rϕ",
            GateKind::U1 => "U1",
            GateKind::U2 => "U2",
            GateKind::U3 => "U3",
            GateKind::Rot | GateKind::CRot => "Rot",
            GateKind::CNOT | GateKind::Toffoli | GateKind::MultiControlledX => "⊕",
            GateKind::CY => "Y",
            GateKind::CZ => "Z",
            GateKind::Swap => "SWAP",
            GateKind::ISwap => "ISWAP",
            GateKind::SISwap => "SISWAP",
            GateKind::IsingXX => "IsingXX",
            GateKind::IsingYY => "IsingYY",
            GateKind::IsingZZ => "IsingZZ",
            GateKind::MultiRZ => "MultiRZ",
            GateKind::CSwap => "SWAP",
            GateKind::QFT => "QFT",
            GateKind::QubitUnitary => "U",
            GateKind::Barrier => "||",
            GateKind::PauliRot => "R",
            GateKind::Hermitian => "𝓗",
            GateKind::QubitDensityMatrix => "QubitDensityMatrix",
            GateKind::BasisState => "BasisState",
        }
    }
}

/// Non-numeric data some gate kinds need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Pauli word for [`GateKind::PauliRot`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pauli_word: Option<String>,
    /// Control values for [`GateKind::MultiControlledX`] (`true` = control on |1⟩).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_values: Option<Vec<bool>>,
    /// Explicit matrix (row-major, 2^n × 2^n) for matrix-defined kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Vec<Complex64>>,
}

impl Hyperparameters {
    /// Whether no hyperparameter is set.
    pub fn is_empty(&self) -> bool {
        self.pauli_word.is_none() && self.control_values.is_none() && self.matrix.is_none()
    }
}

/// A gate of a given kind acting on concrete wires with concrete parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    kind: GateKind,
    wires: Wires,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    params: Vec<f64>,
    #[serde(default)]
    inverse: bool,
    #[serde(default, skip_serializing_if = "Hyperparameters::is_empty")]
    hyper: Hyperparameters,
}

impl Gate {
    /// Create a gate, validating wire and parameter counts.
    pub fn new<W: Into<Wire>>(
        kind: GateKind,
        wires: impl IntoIterator<Item = W>,
        params: impl IntoIterator<Item = f64>,
    ) -> IrResult<Self> {
        Self::with_hyperparameters(kind, wires, params, Hyperparameters::default())
    }

    /// Create a gate with hyperparameters.
    pub fn with_hyperparameters<W: Into<Wire>>(
        kind: GateKind,
        wires: impl IntoIterator<Item = W>,
        params: impl IntoIterator<Item = f64>,
        hyper: Hyperparameters,
    ) -> IrResult<Self> {
        let gate = Self {
            kind,
            wires: Wires::new(wires),
            params: params.into_iter().collect(),
            inverse: false,
            hyper,
        };
        gate.validate()?;
        Ok(gate)
    }

    /// A matrix-defined gate ([`GateKind::QubitUnitary`], [`GateKind::Hermitian`]
    /// or [`GateKind::QubitDensityMatrix`]).
    pub fn from_matrix<W: Into<Wire>>(
        kind: GateKind,
        matrix: &Matrix,
        wires: impl IntoIterator<Item = W>,
    ) -> IrResult<Self> {
        let hyper = Hyperparameters {
            matrix: Some(linalg::to_row_major(matrix)),
            ..Hyperparameters::default()
        };
        Self::with_hyperparameters(kind, wires, [], hyper)
    }

    /// `exp(-iθ/2 P)` for the Pauli word `word` (letters `I`, `X`, `Y`, `Z`).
    pub fn pauli_rot<W: Into<Wire>>(
        theta: f64,
        word: &str,
        wires: impl IntoIterator<Item = W>,
    ) -> IrResult<Self> {
        let hyper = Hyperparameters {
            pauli_word: Some(word.to_string()),
            ..Hyperparameters::default()
        };
        Self::with_hyperparameters(GateKind::PauliRot, wires, [theta], hyper)
    }

    /// Multi-controlled X with explicit control values (`'0'`/`'1'` per control).
    pub fn multi_controlled_x<W: Into<Wire>>(
        control_wires: impl IntoIterator<Item = W>,
        target: impl Into<Wire>,
        control_values: Option<&str>,
    ) -> IrResult<Self> {
        let mut wires: Vec<Wire> = control_wires.into_iter().map(Into::into).collect();
        wires.push(target.into());
        let values = match control_values {
            Some(s) => Some(
                s.chars()
                    .map(|ch| match ch {
                        '0' => Ok(false),
                        '1' => Ok(true),
                        other => Err(IrError::InvalidInput(format!(
                            "control value '{other}' is not 0 or 1"
                        ))),
                    })
                    .collect::<IrResult<Vec<bool>>>()?,
            ),
            None => None,
        };
        let hyper = Hyperparameters {
            control_values: values,
            ..Hyperparameters::default()
        };
        Self::with_hyperparameters(GateKind::MultiControlledX, wires, [], hyper)
    }

    fn validate(&self) -> IrResult<()> {
        let name = self.kind.name();
        let got = self.wires.len();
        match self.kind.num_wires() {
            WireCount::Fixed(n) if n != got => {
                return Err(IrError::WireCountMismatch {
                    name: name.to_string(),
                    expected: n,
                    got,
                });
            }
            WireCount::AtLeast(n) if got < n => {
                return Err(IrError::WireCountMismatch {
                    name: name.to_string(),
                    expected: n,
                    got,
                });
            }
            _ => {}
        }
        self.wires.ensure_unique(name)?;

        let expected_params = self.kind.num_params().unwrap_or(got);
        if self.params.len() != expected_params {
            return Err(IrError::ParameterCountMismatch {
                name: name.to_string(),
                expected: expected_params,
                got: self.params.len(),
            });
        }

        if self.kind.takes_matrix() {
            let dim = 1usize << got;
            match &self.hyper.matrix {
                Some(m) if m.len() == dim * dim => {}
                Some(m) => {
                    return Err(IrError::InvalidMatrix {
                        name: name.to_string(),
                        reason: format!(
                            "expected {} entries for {got} wires, got {}",
                            dim * dim,
                            m.len()
                        ),
                    });
                }
                None => {
                    return Err(IrError::InvalidMatrix {
                        name: name.to_string(),
                        reason: "no matrix given".into(),
                    });
                }
            }
        }
        if self.kind == GateKind::PauliRot {
            let word = self.hyper.pauli_word.as_deref().unwrap_or_default();
            if word.chars().count() != got || !word.chars().all(|ch| "IXYZ".contains(ch)) {
                return Err(IrError::InvalidInput(format!(
                    "Pauli word '{word}' does not match {got} wires"
                )));
            }
        }
        if let Some(values) = &self.hyper.control_values {
            if values.len() + 1 != got {
                return Err(IrError::InvalidInput(format!(
                    "{} control values for {} control wires",
                    values.len(),
                    got - 1
                )));
            }
        }
        Ok(())
    }

    /// The gate kind.
    #[inline]
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// The name, with a `.inv` suffix when the inverse flag is set.
    pub fn name(&self) -> String {
        if self.inverse {
            format!("{}.inv", self.kind.name())
        } else {
            self.kind.name().to_string()
        }
    }

    /// Wires in order.
    #[inline]
    pub fn wires(&self) -> &Wires {
        &self.wires
    }

    /// Replace the wires, keeping the count.
    pub fn set_wires(&mut self, wires: Wires) -> IrResult<()> {
        if wires.len() != self.wires.len() {
            return Err(IrError::WireCountMismatch {
                name: self.kind.name().to_string(),
                expected: self.wires.len(),
                got: wires.len(),
            });
        }
        wires.ensure_unique(self.kind.name())?;
        self.wires = wires;
        Ok(())
    }

    /// Numeric parameters.
    #[inline]
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Replace the numeric parameters, keeping the count.
    pub fn set_params(&mut self, params: &[f64]) -> IrResult<()> {
        if params.len() != self.params.len() {
            return Err(IrError::ParameterCountMismatch {
                name: self.kind.name().to_string(),
                expected: self.params.len(),
                got: params.len(),
            });
        }
        self.params = params.to_vec();
        Ok(())
    }

    /// Hyperparameters.
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyper
    }

    /// Whether the inverse flag is set.
    #[inline]
    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// Set the inverse flag. Observables cannot be inverted.
    pub fn set_inverse(&mut self, inverse: bool) -> IrResult<()> {
        if inverse && !self.kind.is_operation() {
            return Err(IrError::InverseUndefined(self.kind.name().to_string()));
        }
        self.inverse = inverse;
        Ok(())
    }

    /// Toggle the inverse flag.
    pub fn inv(mut self) -> IrResult<Self> {
        let flag = !self.inverse;
        self.set_inverse(flag)?;
        Ok(self)
    }

    /// Capability flags.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_matrix: self.kind.has_matrix(),
            is_observable: self.kind.is_observable(),
            is_operation: self.kind.is_operation(),
        }
    }

    /// Leading control wires.
    pub fn control_wires(&self) -> Wires {
        let n = self.kind.num_control_wires(self.wires.len());
        self.wires.slice(0..n)
    }

    /// Wires that are not control wires.
    pub fn target_wires(&self) -> Wires {
        let n = self.kind.num_control_wires(self.wires.len());
        self.wires.slice(n..self.wires.len())
    }

    /// The matrix, with the inverse flag applied.
    pub fn matrix(&self) -> IrResult<Matrix> {
        let m = matrices::gate_matrix(self)?;
        Ok(if self.inverse { linalg::dagger(&m) } else { m })
    }

    /// Sparse form of the matrix.
    pub fn sparse_matrix(&self) -> IrResult<SparseMatrix> {
        if !self.kind.has_matrix() {
            return Err(IrError::SparseMatrixUndefined(self.name()));
        }
        Ok(SparseMatrix::from_dense(&self.matrix()?))
    }

    /// Eigenvalues of the matrix.
    pub fn eigvals(&self) -> IrResult<Vec<Complex64>> {
        if !self.kind.has_matrix() {
            return Err(IrError::EigvalsUndefined(self.name()));
        }
        linalg::eigenvalues(&self.matrix()?).ok_or_else(|| IrError::EigvalsUndefined(self.name()))
    }

    /// Hermitian generator `G` such that the gate is `exp(-iθ·coeff·G)`-shaped.
    pub fn generator(&self) -> IrResult<Generator> {
        let (coeff, observable) = match self.kind {
            GateKind::RX => (-0.5, Gate::new(GateKind::PauliX, self.wires.iter(), [])?),
            GateKind::RY => (-0.5, Gate::new(GateKind::PauliY, self.wires.iter(), [])?),
            GateKind::RZ => (-0.5, Gate::new(GateKind::PauliZ, self.wires.iter(), [])?),
            GateKind::PhaseShift | GateKind::U1 => (
                1.0,
                Gate::from_matrix(GateKind::Hermitian, &matrices::projector_one(1), self.wires.iter())?,
            ),
            GateKind::ControlledPhaseShift => (
                1.0,
                Gate::from_matrix(GateKind::Hermitian, &matrices::projector_one(2), self.wires.iter())?,
            ),
            GateKind::CRX | GateKind::CRY | GateKind::CRZ => {
                let pauli = match self.kind {
                    GateKind::CRX => matrices::pauli_x(),
                    GateKind::CRY => matrices::pauli_y(),
                    _ => matrices::pauli_z(),
                };
                let h = linalg::kron(&matrices::projector_one(1), &pauli);
                (-0.5, Gate::from_matrix(GateKind::Hermitian, &h, self.wires.iter())?)
            }
            GateKind::IsingXX | GateKind::IsingYY | GateKind::IsingZZ => {
                let word = match self.kind {
                    GateKind::IsingXX => "XX",
                    GateKind::IsingYY => "YY",
                    _ => "ZZ",
                };
                let h = matrices::pauli_word(word)?;
                (-0.5, Gate::from_matrix(GateKind::Hermitian, &h, self.wires.iter())?)
            }
            GateKind::MultiRZ => {
                let word = "Z".repeat(self.wires.len());
                let h = matrices::pauli_word(&word)?;
                (-0.5, Gate::from_matrix(GateKind::Hermitian, &h, self.wires.iter())?)
            }
            GateKind::PauliRot => {
                let word = self.hyper.pauli_word.as_deref().unwrap_or_default();
                let h = matrices::pauli_word(word)?;
                (-0.5, Gate::from_matrix(GateKind::Hermitian, &h, self.wires.iter())?)
            }
            _ => return Err(IrError::GeneratorUndefined(self.name())),
        };
        let coeff = if self.inverse { -coeff } else { coeff };
        Ok(Generator { coeff, observable })
    }

    fn same_kind(&self, kind: GateKind, params: Vec<f64>) -> IrResult<Operator> {
        Ok(Gate::with_hyperparameters(kind, self.wires.iter(), params, self.hyper.clone())?.into())
    }

    fn on_wire(kind: GateKind, wire: &Wire, params: Vec<f64>) -> IrResult<Operator> {
        Ok(Gate::new(kind, [wire], params)?.into())
    }

    /// Native power decomposition `self ** z`.
    ///
    /// Fails with [`IrError::PowUndefined`] when the kind has no rule for `z`.
    pub fn pow(&self, z: Exponent) -> IrResult<Vec<Operator>> {
        let zf = z.as_f64();
        if zf == 0.0 {
            return Ok(vec![]);
        }
        if zf == 1.0 {
            return Ok(vec![self.clone().into()]);
        }

        // (G†)^z = G^{-z}
        let mut base = self.clone();
        base.inverse = false;
        let zf = if self.inverse { -zf } else { zf };
        let undefined = || IrError::PowUndefined {
            name: self.name(),
            exponent: z.to_string(),
        };
        let generic = |m: f64| -> IrResult<Vec<Operator>> {
            if m.abs() < POW_TOL {
                Ok(vec![])
            } else if (m - 1.0).abs() < POW_TOL {
                Ok(vec![base.clone().into()])
            } else {
                Err(undefined())
            }
        };
        let near = |a: f64, b: f64| (a - b).abs() < POW_TOL;
        let w0 = self.wires.get(0);

        match self.kind {
            GateKind::Identity | GateKind::Barrier => Ok(vec![base.clone().into()]),
            GateKind::PauliX => {
                let m = zf.rem_euclid(2.0);
                match w0 {
                    Some(w) if near(m, 0.5) => Ok(vec![Self::on_wire(GateKind::SX, w, vec![])?]),
                    _ => generic(m),
                }
            }
            GateKind::PauliY
            | GateKind::Hadamard
            | GateKind::CNOT
            | GateKind::CY
            | GateKind::CZ
            | GateKind::Swap
            | GateKind::Toffoli
            | GateKind::CSwap
            | GateKind::MultiControlledX => generic(zf.rem_euclid(2.0)),
            GateKind::PauliZ => {
                let m = zf.rem_euclid(2.0);
                let Some(w) = w0 else { return generic(m) };
                if near(m, 0.0) || near(m, 1.0) {
                    generic(m)
                } else if near(m, 0.5) {
                    Ok(vec![Self::on_wire(GateKind::S, w, vec![])?])
                } else if near(m, 0.25) {
                    Ok(vec![Self::on_wire(GateKind::T, w, vec![])?])
                } else {
                    Ok(vec![Self::on_wire(GateKind::PhaseShift, w, vec![PI * m])?])
                }
            }
            GateKind::S => {
                let m = zf.rem_euclid(4.0);
                let Some(w) = w0 else { return generic(m) };
                if near(m, 0.0) || near(m, 1.0) {
                    generic(m)
                } else if near(m, 0.5) {
                    Ok(vec![Self::on_wire(GateKind::T, w, vec![])?])
                } else if near(m, 2.0) {
                    Ok(vec![Self::on_wire(GateKind::PauliZ, w, vec![])?])
                } else {
                    Ok(vec![Self::on_wire(GateKind::PhaseShift, w, vec![PI / 2.0 * m])?])
                }
            }
            GateKind::T => {
                let m = zf.rem_euclid(8.0);
                let Some(w) = w0 else { return generic(m) };
                if near(m, 0.0) || near(m, 1.0) {
                    generic(m)
                } else if near(m, 2.0) {
                    Ok(vec![Self::on_wire(GateKind::S, w, vec![])?])
                } else if near(m, 4.0) {
                    Ok(vec![Self::on_wire(GateKind::PauliZ, w, vec![])?])
                } else {
                    Ok(vec![Self::on_wire(GateKind::PhaseShift, w, vec![PI / 4.0 * m])?])
                }
            }
            GateKind::SX => {
                let m = zf.rem_euclid(4.0);
                match w0 {
                    Some(w) if near(m, 2.0) => Ok(vec![Self::on_wire(GateKind::PauliX, w, vec![])?]),
                    _ => generic(m),
                }
            }
            GateKind::ISwap => {
                let m = zf.rem_euclid(4.0);
                if near(m, 0.5) {
                    Ok(vec![self.same_kind(GateKind::SISwap, vec![])?])
                } else if near(m, 2.0) {
                    self.pauli_z_pair()
                } else {
                    generic(m)
                }
            }
            GateKind::SISwap => {
                let m = zf.rem_euclid(8.0);
                if near(m, 2.0) {
                    Ok(vec![self.same_kind(GateKind::ISwap, vec![])?])
                } else if near(m, 4.0) {
                    self.pauli_z_pair()
                } else {
                    generic(m)
                }
            }
            GateKind::RX
            | GateKind::RY
            | GateKind::RZ
            | GateKind::PhaseShift
            | GateKind::U1
            | GateKind::ControlledPhaseShift
            | GateKind::CRX
            | GateKind::CRY
            | GateKind::CRZ
            | GateKind::IsingXX
            | GateKind::IsingYY
            | GateKind::IsingZZ
            | GateKind::MultiRZ
            | GateKind::PauliRot => {
                let scaled = base.params.iter().map(|p| p * zf).collect();
                Ok(vec![self.same_kind(self.kind, scaled)?])
            }
            _ => generic(zf),
        }
    }

    fn pauli_z_pair(&self) -> IrResult<Vec<Operator>> {
        self.wires
            .iter()
            .map(|w| Self::on_wire(GateKind::PauliZ, w, vec![]))
            .collect()
    }

    /// Decomposition into simpler gates, in application order.
    pub fn decomposition(&self) -> IrResult<Vec<Operator>> {
        let ops: Vec<Operator> = match self.kind {
            GateKind::Identity | GateKind::Barrier => vec![],
            GateKind::Rot => {
                let (phi, theta, omega) = (self.params[0], self.params[1], self.params[2]);
                let w = &self.wires;
                let seq = if self.inverse {
                    [(GateKind::RZ, -omega), (GateKind::RY, -theta), (GateKind::RZ, -phi)]
                } else {
                    [(GateKind::RZ, phi), (GateKind::RY, theta), (GateKind::RZ, omega)]
                };
                seq.into_iter()
                    .map(|(kind, angle)| Ok(Gate::new(kind, w.iter(), [angle])?.into()))
                    .collect::<IrResult<_>>()?
            }
            GateKind::Swap => {
                let (a, b) = (&self.wires.as_slice()[0], &self.wires.as_slice()[1]);
                vec![
                    Gate::new(GateKind::CNOT, [a, b], [])?.into(),
                    Gate::new(GateKind::CNOT, [b, a], [])?.into(),
                    Gate::new(GateKind::CNOT, [a, b], [])?.into(),
                ]
            }
            _ => return Err(IrError::DecompositionUndefined(self.name())),
        };
        Ok(ops)
    }

    /// Gates that rotate the computational basis into this observable's eigenbasis.
    pub fn diagonalizing_gates(&self) -> IrResult<Vec<Operator>> {
        let w = &self.wires;
        let ops: Vec<Operator> = match self.kind {
            GateKind::Identity | GateKind::PauliZ => vec![],
            GateKind::PauliX => vec![Gate::new(GateKind::Hadamard, w.iter(), [])?.into()],
            GateKind::PauliY => vec![
                Gate::new(GateKind::PauliZ, w.iter(), [])?.into(),
                Gate::new(GateKind::S, w.iter(), [])?.into(),
                Gate::new(GateKind::Hadamard, w.iter(), [])?.into(),
            ],
            GateKind::Hadamard => vec![Gate::new(GateKind::RY, w.iter(), [-PI / 4.0])?.into()],
            GateKind::Hermitian => {
                let (_, v) = linalg::eigh(&self.matrix()?)
                    .ok_or_else(|| IrError::DiagonalizingGatesUndefined(self.name()))?;
                vec![Gate::from_matrix(GateKind::QubitUnitary, &linalg::dagger(&v), w.iter())?.into()]
            }
            _ => return Err(IrError::DiagonalizingGatesUndefined(self.name())),
        };
        Ok(ops)
    }

    /// Drawing label, optionally with parameters rounded to `decimals` places.
    pub fn label(&self, decimals: Option<usize>) -> String {
        let mut out = self.kind.label().to_string();
        if self.inverse {
            out.push_str("⁻¹");
        }
        if let Some(d) = decimals {
            if !self.params.is_empty() && self.kind != GateKind::BasisState {
                let rendered: Vec<String> = self.params.iter().map(|p| format!("{p:.d$}")).collect();
                out.push_str(&format!("\n({})", rendered.join(",")));
            }
        }
        out
    }
}

impl From<Gate> for Operator {
    fn from(gate: Gate) -> Self {
        Operator::Gate(gate)
    }
}
