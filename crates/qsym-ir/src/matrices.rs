//! Closed-form gate matrices.
//!
//! Layouts follow the usual convention: the first wire of a gate is the most
//! significant bit of the row/column index.

use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateKind};
use crate::linalg::{self, Matrix, c};

fn m2(a: Complex64, b: Complex64, cc: Complex64, d: Complex64) -> Matrix {
    Matrix::from_shape_vec((2, 2), vec![a, b, cc, d]).unwrap_or_else(|_| linalg::identity(2))
}

fn phase(angle: f64) -> Complex64 {
    Complex64::from_polar(1.0, angle)
}

/// Pauli-X.
pub fn pauli_x() -> Matrix {
    m2(c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0))
}

/// Pauli-Y.
pub fn pauli_y() -> Matrix {
    m2(c(0.0, 0.0), c(0.0, -1.0), c(0.0, 1.0), c(0.0, 0.0))
}

/// Pauli-Z.
pub fn pauli_z() -> Matrix {
    m2(c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0))
}

/// Hadamard.
pub fn hadamard() -> Matrix {
    let s = FRAC_1_SQRT_2;
    m2(c(s, 0.0), c(s, 0.0), c(s, 0.0), c(-s, 0.0))
}

/// Projector onto `|1…1⟩` for `n` wires.
pub fn projector_one(n: usize) -> Matrix {
    let dim = 1usize << n;
    let mut out = Matrix::zeros((dim, dim));
    out[[dim - 1, dim - 1]] = c(1.0, 0.0);
    out
}

/// Tensor product of single-qubit Paulis named by `word`.
pub fn pauli_word(word: &str) -> IrResult<Matrix> {
    word.chars().try_fold(linalg::identity(1), |acc, ch| {
        let p = match ch {
            'I' => linalg::identity(2),
            'X' => pauli_x(),
            'Y' => pauli_y(),
            'Z' => pauli_z(),
            other => {
                return Err(IrError::InvalidInput(format!(
                    "'{other}' is not a Pauli letter"
                )));
            }
        };
        Ok(linalg::kron(&acc, &p))
    })
}

/// `exp(-iθ/2 P)` for a Pauli string matrix `P`.
fn pauli_exp(p: &Matrix, theta: f64) -> Matrix {
    let (s, co) = (theta / 2.0).sin_cos();
    let dim = p.nrows();
    linalg::scale(&linalg::identity(dim), c(co, 0.0)) + linalg::scale(p, c(0.0, -s))
}

fn rx(theta: f64) -> Matrix {
    let (s, co) = (theta / 2.0).sin_cos();
    m2(c(co, 0.0), c(0.0, -s), c(0.0, -s), c(co, 0.0))
}

fn ry(theta: f64) -> Matrix {
    let (s, co) = (theta / 2.0).sin_cos();
    m2(c(co, 0.0), c(-s, 0.0), c(s, 0.0), c(co, 0.0))
}

fn rz(theta: f64) -> Matrix {
    m2(phase(-theta / 2.0), c(0.0, 0.0), c(0.0, 0.0), phase(theta / 2.0))
}

fn phase_shift(phi: f64) -> Matrix {
    m2(c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), phase(phi))
}

fn u3(theta: f64, phi: f64, lambda: f64) -> Matrix {
    let (s, co) = (theta / 2.0).sin_cos();
    m2(
        c(co, 0.0),
        -phase(lambda) * s,
        phase(phi) * s,
        phase(phi + lambda) * co,
    )
}

/// `Rot(φ, θ, ω) = RZ(ω) RY(θ) RZ(φ)`.
fn rot(phi: f64, theta: f64, omega: f64) -> Matrix {
    let (s, co) = (theta / 2.0).sin_cos();
    m2(
        phase(-(phi + omega) / 2.0) * co,
        -phase((phi - omega) / 2.0) * s,
        phase(-(phi - omega) / 2.0) * s,
        phase((phi + omega) / 2.0) * co,
    )
}

fn swap() -> Matrix {
    let mut out = Matrix::zeros((4, 4));
    out[[0, 0]] = c(1.0, 0.0);
    out[[1, 2]] = c(1.0, 0.0);
    out[[2, 1]] = c(1.0, 0.0);
    out[[3, 3]] = c(1.0, 0.0);
    out
}

fn iswap_like(co: f64, s: f64) -> Matrix {
    let mut out = Matrix::zeros((4, 4));
    out[[0, 0]] = c(1.0, 0.0);
    out[[1, 1]] = c(co, 0.0);
    out[[1, 2]] = c(0.0, s);
    out[[2, 1]] = c(0.0, s);
    out[[2, 2]] = c(co, 0.0);
    out[[3, 3]] = c(1.0, 0.0);
    out
}

fn qft(n: usize) -> Matrix {
    let dim = 1usize << n;
    let norm = 1.0 / (dim as f64).sqrt();
    Matrix::from_shape_fn((dim, dim), |(j, k)| {
        let angle = 2.0 * PI * ((j * k) % dim) as f64 / dim as f64;
        phase(angle) * norm
    })
}

/// Permutation matrix of an X on the last wire, conditioned on the control
/// pattern `values` over the leading wires.
fn multi_controlled_x(num_wires: usize, values: Option<&[bool]>) -> Matrix {
    let dim = 1usize << num_wires;
    let controls = num_wires - 1;
    let mut wanted = 0usize;
    for i in 0..controls {
        let on = values.map_or(true, |v| v[i]);
        if on {
            wanted |= 1 << (controls - 1 - i);
        }
    }
    let mut out = Matrix::zeros((dim, dim));
    for row in 0..dim {
        let col = if row >> 1 == wanted { row ^ 1 } else { row };
        out[[row, col]] = c(1.0, 0.0);
    }
    out
}

/// Matrix of `gate` ignoring its inverse flag.
pub(crate) fn gate_matrix(gate: &Gate) -> IrResult<Matrix> {
    let p = gate.params();
    let n = gate.wires().len();
    let m = match gate.kind() {
        GateKind::Identity => linalg::identity(1 << n),
        GateKind::PauliX => pauli_x(),
        GateKind::PauliY => pauli_y(),
        GateKind::PauliZ => pauli_z(),
        GateKind::Hadamard => hadamard(),
        GateKind::S => phase_shift(PI / 2.0),
        GateKind::T => phase_shift(PI / 4.0),
        GateKind::SX => m2(c(0.5, 0.5), c(0.5, -0.5), c(0.5, -0.5), c(0.5, 0.5)),
        GateKind::RX => rx(p[0]),
        GateKind::RY => ry(p[0]),
        GateKind::RZ => rz(p[0]),
        GateKind::PhaseShift | GateKind::U1 => phase_shift(p[0]),
        GateKind::U2 => u3(PI / 2.0, p[0], p[1]),
        GateKind::U3 => u3(p[0], p[1], p[2]),
        GateKind::Rot => rot(p[0], p[1], p[2]),
        GateKind::CNOT => linalg::controlled(&pauli_x(), 1),
        GateKind::CY => linalg::controlled(&pauli_y(), 1),
        GateKind::CZ => linalg::controlled(&pauli_z(), 1),
        GateKind::Swap => swap(),
        GateKind::ISwap => iswap_like(0.0, 1.0),
        GateKind::SISwap => iswap_like(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
        GateKind::ControlledPhaseShift => linalg::controlled(&phase_shift(p[0]), 1),
        GateKind::CRX => linalg::controlled(&rx(p[0]), 1),
        GateKind::CRY => linalg::controlled(&ry(p[0]), 1),
        GateKind::CRZ => linalg::controlled(&rz(p[0]), 1),
        GateKind::CRot => linalg::controlled(&rot(p[0], p[1], p[2]), 1),
        GateKind::IsingXX => pauli_exp(&pauli_word("XX")?, p[0]),
        GateKind::IsingYY => pauli_exp(&pauli_word("YY")?, p[0]),
        GateKind::IsingZZ => pauli_exp(&pauli_word("ZZ")?, p[0]),
        GateKind::MultiRZ => pauli_exp(&pauli_word(&"Z".repeat(n))?, p[0]),
        GateKind::PauliRot => {
            let word = gate.hyperparameters().pauli_word.as_deref().unwrap_or_default();
            pauli_exp(&pauli_word(word)?, p[0])
        }
        GateKind::Toffoli => linalg::controlled(&pauli_x(), 2),
        GateKind::CSwap => linalg::controlled(&swap(), 1),
        GateKind::MultiControlledX => {
            multi_controlled_x(n, gate.hyperparameters().control_values.as_deref())
        }
        GateKind::QFT => qft(n),
        GateKind::QubitUnitary | GateKind::Hermitian => {
            let dim = 1usize << n;
            let data = gate
                .hyperparameters()
                .matrix
                .clone()
                .ok_or_else(|| IrError::matrix_undefined(gate.name()))?;
            linalg::from_rows(dim, dim, data).ok_or_else(|| IrError::InvalidMatrix {
                name: gate.name(),
                reason: "matrix is not square".into(),
            })?
        }
        GateKind::Barrier | GateKind::QubitDensityMatrix | GateKind::BasisState => {
            return Err(IrError::matrix_undefined(gate.name()));
        }
    };
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::allclose;

    fn is_unitary(m: &Matrix) -> bool {
        allclose(&linalg::dagger(m).dot(m), &linalg::identity(m.nrows()), 1e-12)
    }

    #[test]
    fn test_rot_matches_zyz_product() {
        let (phi, theta, omega) = (0.3, 1.1, -0.7);
        let product = rz(omega).dot(&ry(theta)).dot(&rz(phi));
        assert!(allclose(&rot(phi, theta, omega), &product, 1e-12));
    }

    #[test]
    fn test_u3_relations() {
        // U3(θ, φ, λ) = e^{i(φ+λ)/2} Rot(λ, θ, φ)
        let (theta, phi, lambda) = (0.4, 0.9, -1.3);
        let scaled = linalg::scale(&rot(lambda, theta, phi), phase((phi + lambda) / 2.0));
        assert!(allclose(&u3(theta, phi, lambda), &scaled, 1e-12));
    }

    #[test]
    fn test_ising_and_multirz() {
        let zz = pauli_exp(&pauli_word("ZZ").unwrap(), 0.8);
        assert!(linalg::is_diagonal(&zz, 1e-12));
        assert!((zz[[0, 0]] - phase(-0.4)).norm() < 1e-12);
        assert!((zz[[1, 1]] - phase(0.4)).norm() < 1e-12);
        assert!(is_unitary(&pauli_exp(&pauli_word("XY").unwrap(), 0.8)));
    }

    #[test]
    fn test_all_closed_forms_unitary() {
        for m in [
            hadamard(),
            iswap_like(0.0, 1.0),
            iswap_like(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            qft(3),
            multi_controlled_x(3, Some(&[false, true])),
        ] {
            assert!(is_unitary(&m));
        }
    }

    #[test]
    fn test_siswap_squares_to_iswap() {
        let s = iswap_like(FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        assert!(allclose(&s.dot(&s), &iswap_like(0.0, 1.0), 1e-12));
    }

    #[test]
    fn test_mcx_control_values() {
        // control pattern 0 on a two-wire MCX flips the target when the control is |0⟩
        let m = multi_controlled_x(2, Some(&[false]));
        assert_eq!(m[[0, 1]], c(1.0, 0.0));
        assert_eq!(m[[2, 2]], c(1.0, 0.0));
    }

    #[test]
    fn test_bad_pauli_letter() {
        assert!(matches!(pauli_word("XQ"), Err(IrError::InvalidInput(_))));
    }
}
