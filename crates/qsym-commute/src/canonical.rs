//! Folding parametrized gates into the simplest equivalent gate.
//!
//! Uncontrolled gates are folded modulo global phase. Gates that sit under a
//! control (the target of `CRot`/`CRX`/... and the body of a generic
//! [`Controlled`]) are folded exactly, since a global phase on the body is a
//! relative phase on the controls.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use qsym_ir::{Controlled, Gate, GateKind, Operator, linalg};

use crate::error::{CommuteError, CommuteResult};

/// Angle tolerance used by [`simplify_rotation`].
pub const DEFAULT_ANGLE_ATOL: f64 = 1e-8;

const FOUR_PI: f64 = 2.0 * TAU;

/// Whether `x ≡ target (mod period)` within `atol`.
pub(crate) fn near_mod(x: f64, target: f64, period: f64, atol: f64) -> bool {
    let r = (x - target).rem_euclid(period);
    r <= atol || period - r <= atol
}

/// A `Rot` that reduces to a single fundamental gate.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Reduced {
    X(f64),
    Y(f64),
    Z(f64),
    Hadamard,
}

/// Reduce `Rot(φ, θ, ω) = RZ(ω) RY(θ) RZ(φ)`.
///
/// Every rule except the Hadamard one is exact (the `2π` multiples are folded
/// into the resulting angle); the Hadamard rule holds only up to a global
/// phase of `-i`.
fn reduce_rot(phi: f64, theta: f64, omega: f64, phase_free: bool, atol: f64) -> Option<Reduced> {
    let is = |x: f64, target: f64| near_mod(x, target, TAU, atol);
    if is(theta, 0.0) {
        Some(Reduced::Z(phi + theta + omega))
    } else if is(phi, 0.0) && is(omega, 0.0) {
        Some(Reduced::Y(theta + phi + omega))
    } else if is(phi, FRAC_PI_2) && is(omega, -FRAC_PI_2) {
        Some(Reduced::X(theta + phi + omega))
    } else if is(phi, -FRAC_PI_2) && is(omega, FRAC_PI_2) {
        Some(Reduced::X(-theta + phi + omega))
    } else if phase_free && is(phi, PI) && is(theta, FRAC_PI_2) && is(omega, 0.0) {
        Some(Reduced::Hadamard)
    } else {
        None
    }
}

/// `(φ, θ, ω)` such that the gate equals `Rot(φ, θ, ω)`, exactly for
/// `Rot`/`CRot` and up to global phase for `U2`/`U3`. The inverse flag is
/// folded in.
fn rot_angles(g: &Gate) -> (f64, f64, f64) {
    let p = g.params();
    let (phi, theta, omega) = match g.kind() {
        // U3(θ, φ, λ) = e^{i(φ+λ)/2} Rot(λ, θ, φ)
        GateKind::U3 => (p[2], p[0], p[1]),
        GateKind::U2 => (p[1], FRAC_PI_2, p[0]),
        _ => (p[0], p[1], p[2]),
    };
    if g.is_inverse() {
        (-omega, -theta, -phi)
    } else {
        (phi, theta, omega)
    }
}

fn angle(g: &Gate) -> f64 {
    let a = g.params()[0];
    if g.is_inverse() { -a } else { a }
}

fn identity_on(g: &Gate) -> CommuteResult<Operator> {
    Ok(Gate::new(GateKind::Identity, g.wires().iter(), [])?.into())
}

/// A single-parameter rotation on `g`'s wires, or the identity if the angle
/// vanishes modulo `period`.
fn rotation_or_identity(g: &Gate, kind: GateKind, theta: f64, period: f64, atol: f64) -> CommuteResult<Operator> {
    if near_mod(theta, 0.0, period, atol) {
        identity_on(g)
    } else {
        Ok(Gate::new(kind, g.wires().iter(), [theta])?.into())
    }
}

/// `CRX`/`CRY`/`CRZ` by `theta`: the identity at `0 (mod 4π)`, `Z` on the
/// control at `2π (mod 4π)`.
fn controlled_rotation(g: &Gate, kind: GateKind, theta: f64, atol: f64) -> CommuteResult<Operator> {
    if near_mod(theta, 0.0, FOUR_PI, atol) {
        identity_on(g)
    } else if near_mod(theta, TAU, FOUR_PI, atol) {
        let control = g.wires().as_slice()[0].clone();
        Ok(Gate::new(GateKind::PauliZ, [control], [])?.into())
    } else {
        Ok(Gate::new(kind, g.wires().iter(), [theta])?.into())
    }
}

fn canonicalize_gate(g: &Gate, atol: f64, exact: bool) -> CommuteResult<Operator> {
    let rotation_period = if exact { FOUR_PI } else { TAU };
    match g.kind() {
        GateKind::RX
        | GateKind::RY
        | GateKind::RZ
        | GateKind::IsingXX
        | GateKind::IsingYY
        | GateKind::IsingZZ
        | GateKind::MultiRZ => {
            if near_mod(angle(g), 0.0, rotation_period, atol) {
                identity_on(g)
            } else {
                Ok(g.clone().into())
            }
        }
        GateKind::PhaseShift | GateKind::U1 | GateKind::ControlledPhaseShift => {
            if near_mod(angle(g), 0.0, TAU, atol) {
                identity_on(g)
            } else {
                Ok(g.clone().into())
            }
        }
        GateKind::CRX | GateKind::CRY | GateKind::CRZ => {
            controlled_rotation(g, g.kind(), angle(g), atol)
        }
        GateKind::Rot | GateKind::U2 | GateKind::U3 => {
            // U2/U3 only match Rot up to a phase
            if exact && g.kind() != GateKind::Rot {
                return Ok(g.clone().into());
            }
            let (phi, theta, omega) = rot_angles(g);
            match reduce_rot(phi, theta, omega, !exact, atol) {
                Some(Reduced::X(a)) => rotation_or_identity(g, GateKind::RX, a, rotation_period, atol),
                Some(Reduced::Y(a)) => rotation_or_identity(g, GateKind::RY, a, rotation_period, atol),
                Some(Reduced::Z(a)) => rotation_or_identity(g, GateKind::RZ, a, rotation_period, atol),
                Some(Reduced::Hadamard) => Ok(Gate::new(GateKind::Hadamard, g.wires().iter(), [])?.into()),
                None => Ok(g.clone().into()),
            }
        }
        GateKind::CRot => {
            let (phi, theta, omega) = rot_angles(g);
            match reduce_rot(phi, theta, omega, false, atol) {
                Some(Reduced::X(a)) => controlled_rotation(g, GateKind::CRX, a, atol),
                Some(Reduced::Y(a)) => controlled_rotation(g, GateKind::CRY, a, atol),
                Some(Reduced::Z(a)) => controlled_rotation(g, GateKind::CRZ, a, atol),
                _ => Ok(g.clone().into()),
            }
        }
        _ => Ok(g.clone().into()),
    }
}

/// Fold a generic controlled operation with a single-wire body.
///
/// A body equal to the identity makes the whole operation the identity; a
/// body equal to some other multiple of the identity leaves a phase on the
/// controls only, which is returned as an opaque unitary.
fn canonicalize_controlled(c: &Controlled, atol: f64) -> CommuteResult<Operator> {
    let [body] = c.body() else {
        return Ok(c.clone().into());
    };
    let body = if c.is_inverse() {
        body.clone().inv()?
    } else {
        body.clone()
    };
    let body = match body {
        Operator::Gate(g) => canonicalize_gate(&g, atol, true)?,
        other => other,
    };
    if body.has_matrix() {
        let m = body.matrix()?;
        if linalg::is_scalar(&m, atol) {
            let wires = c.wires();
            if (m[[0, 0]] - linalg::c(1.0, 0.0)).norm() <= atol {
                return Ok(Gate::new(GateKind::Identity, wires.iter(), [])?.into());
            }
            let full = Operator::from(c.clone()).matrix()?;
            return Ok(Gate::from_matrix(GateKind::QubitUnitary, &full, wires.iter())?.into());
        }
    }
    Ok(Controlled::new(vec![body], c.control_wires().iter())?.into())
}

/// Canonical form of `op` for the rule table.
///
/// Zero-angle rotations become `Identity`, `Rot`/`U2`/`U3` collapse to
/// `RX`/`RY`/`RZ`/`Hadamard` at special angles, `CRot` collapses to
/// `CRX`/`CRY`/`CRZ`, and a controlled rotation by `2π` becomes `PauliZ` on
/// its control. Powers are returned unchanged.
pub fn canonicalize(op: &Operator, atol: f64) -> CommuteResult<Operator> {
    match op {
        Operator::Gate(g) => canonicalize_gate(g, atol, false),
        Operator::Controlled(c) => canonicalize_controlled(c, atol),
        Operator::Pow(_) => Ok(op.clone()),
    }
}

/// Simplify a `Rot`, `U2`, `U3` or `CRot` gate to the simplest equivalent
/// gate, up to global phase for the uncontrolled ones.
pub fn simplify_rotation(gate: &Gate) -> CommuteResult<Operator> {
    match gate.kind() {
        GateKind::Rot | GateKind::U2 | GateKind::U3 | GateKind::CRot => {
            canonicalize_gate(gate, DEFAULT_ANGLE_ATOL, false)
        }
        _ => Err(CommuteError::NotARotation(gate.name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsym_ir::linalg::allclose;

    fn gate(kind: GateKind, wires: &[i64], params: &[f64]) -> Gate {
        Gate::new(kind, wires.iter().copied(), params.iter().copied()).unwrap()
    }

    fn simplified_kind(g: &Gate) -> Option<GateKind> {
        simplify_rotation(g).unwrap().gate_kind()
    }

    #[test]
    fn test_near_mod() {
        assert!(near_mod(TAU, 0.0, TAU, 1e-9));
        assert!(near_mod(-1e-12, 0.0, TAU, 1e-9));
        assert!(near_mod(-FRAC_PI_2 + 4.0 * PI, -FRAC_PI_2, TAU, 1e-9));
        assert!(!near_mod(0.1, 0.0, TAU, 1e-9));
        assert!(!near_mod(TAU, 0.0, FOUR_PI, 1e-9));
    }

    #[test]
    fn test_rot_reductions() {
        assert_eq!(simplified_kind(&gate(GateKind::Rot, &[0], &[FRAC_PI_2, 0.1, -FRAC_PI_2])), Some(GateKind::RX));
        assert_eq!(simplified_kind(&gate(GateKind::Rot, &[0], &[0.0, 0.1, 0.0])), Some(GateKind::RY));
        assert_eq!(simplified_kind(&gate(GateKind::Rot, &[0], &[0.1, 0.0, 0.2])), Some(GateKind::RZ));
        assert_eq!(simplified_kind(&gate(GateKind::Rot, &[0], &[PI, FRAC_PI_2, 0.0])), Some(GateKind::Hadamard));
        assert_eq!(simplified_kind(&gate(GateKind::Rot, &[0], &[0.1, 0.2, 0.3])), Some(GateKind::Rot));
        assert_eq!(simplified_kind(&gate(GateKind::Rot, &[0], &[0.0, 0.0, 0.0])), Some(GateKind::Identity));
    }

    #[test]
    fn test_u2_u3_reductions() {
        assert_eq!(simplified_kind(&gate(GateKind::U2, &[0], &[TAU, -TAU])), Some(GateKind::RY));
        assert_eq!(simplified_kind(&gate(GateKind::U2, &[0], &[FRAC_PI_2, -FRAC_PI_2])), Some(GateKind::RX));
        assert_eq!(simplified_kind(&gate(GateKind::U3, &[0], &[0.0, 0.1, 0.0])), Some(GateKind::RZ));
        assert_eq!(simplified_kind(&gate(GateKind::U3, &[0], &[0.1, 0.0, 0.0])), Some(GateKind::RY));
        assert_eq!(simplified_kind(&gate(GateKind::U3, &[0], &[0.1, -FRAC_PI_2, FRAC_PI_2])), Some(GateKind::RX));
    }

    #[test]
    fn test_reductions_preserve_matrix_up_to_phase() {
        for g in [
            gate(GateKind::Rot, &[0], &[FRAC_PI_2, 0.7, -FRAC_PI_2]),
            gate(GateKind::Rot, &[0], &[-FRAC_PI_2, 0.7, FRAC_PI_2]),
            gate(GateKind::Rot, &[0], &[0.3, TAU, 0.4]),
            gate(GateKind::U3, &[0], &[0.4, -FRAC_PI_2, FRAC_PI_2]),
            gate(GateKind::U2, &[0], &[TAU, -TAU]),
        ] {
            let original = g.matrix().unwrap();
            let reduced = simplify_rotation(&g).unwrap().matrix().unwrap();
            // align the global phase on the largest entry
            let (idx, _) = original
                .indexed_iter()
                .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
                .unwrap();
            let phase = original[idx] / reduced[idx];
            assert!((phase.norm() - 1.0).abs() < 1e-9);
            assert!(allclose(&linalg::scale(&reduced, phase), &original, 1e-9), "{}", g.name());
        }
    }

    #[test]
    fn test_crot_reductions_are_exact() {
        for params in [[FRAC_PI_2, 0.3, -FRAC_PI_2], [0.0, 0.3, 0.0], [0.1, 0.0, 0.2], [0.3, TAU, 0.4]] {
            let g = gate(GateKind::CRot, &[0, 1], &params);
            let reduced = simplify_rotation(&g).unwrap();
            assert!(allclose(&reduced.matrix().unwrap(), &g.matrix().unwrap(), 1e-9));
        }
        // no Hadamard rule under a control
        let h = gate(GateKind::CRot, &[0, 1], &[PI, FRAC_PI_2, 0.0]);
        assert_eq!(simplified_kind(&h), Some(GateKind::CRot));
    }

    #[test]
    fn test_controlled_rotation_by_two_pi() {
        let crx = gate(GateKind::CRX, &[4, 7], &[TAU]);
        let c = canonicalize(&crx.clone().into(), 1e-9).unwrap();
        assert_eq!(c.gate_kind(), Some(GateKind::PauliZ));
        assert_eq!(c.wires().as_slice(), &[qsym_ir::Wire::Int(4)]);
        assert!(allclose(
            &c.matrix_on(crx.wires()).unwrap(),
            &crx.matrix().unwrap(),
            1e-9
        ));

        let crz = gate(GateKind::CRZ, &[0, 1], &[2.0 * TAU]);
        assert_eq!(canonicalize(&crz.into(), 1e-9).unwrap().gate_kind(), Some(GateKind::Identity));
    }

    #[test]
    fn test_controlled_body() {
        let body: Operator = gate(GateKind::RZ, &[1], &[TAU]).into();
        let c = Controlled::new(vec![body], [0]).unwrap();
        // RZ(2π) = -I: a phase on the control, not the identity
        let folded = canonicalize(&c.clone().into(), 1e-9).unwrap();
        assert_eq!(folded.gate_kind(), Some(GateKind::QubitUnitary));

        let zero: Operator = gate(GateKind::RX, &[1], &[2.0 * TAU]).into();
        let c = Controlled::new(vec![zero], [0]).unwrap();
        assert_eq!(canonicalize(&c.into(), 1e-9).unwrap().gate_kind(), Some(GateKind::Identity));
    }

    #[test]
    fn test_not_a_rotation() {
        assert!(matches!(
            simplify_rotation(&gate(GateKind::RX, &[0], &[0.1])),
            Err(CommuteError::NotARotation(_))
        ));
    }
}
