//! McMurchie-Davidson evaluation of primitive Gaussian integrals.
//!
//! Primitives here carry explicit Cartesian exponent triples; the shell
//! level evaluators in this module's siblings drive these functions once
//! per component pair and contract over primitives.
//!
//! Reference: Goings, J. Integrals. <https://joshuagoings.com/2017/04/28/integrals/>

use boys::micb25::boys;
use nalgebra::Vector3;

use crate::tables::tables;

/// Hermite expansion coefficient `E_t^{ij}` for a 1d Gaussian product.
/// `ab` is the center displacement `A - B` along the axis.
pub(crate) fn hermite_expansion([i, j, t]: [i32; 3], ab: f64, a: f64, b: f64) -> f64 {
    let p = a + b;
    let q = a * b / p;

    if t < 0 || t > i + j || i < 0 || j < 0 {
        0.0
    } else if i == 0 && j == 0 && t == 0 {
        (-q * ab * ab).exp()
    } else if j == 0 {
        0.5 / p * hermite_expansion([i - 1, j, t - 1], ab, a, b)
            - q * ab / a * hermite_expansion([i - 1, j, t], ab, a, b)
            + (t + 1) as f64 * hermite_expansion([i - 1, j, t + 1], ab, a, b)
    } else {
        0.5 / p * hermite_expansion([i, j - 1, t - 1], ab, a, b)
            + q * ab / b * hermite_expansion([i, j - 1, t], ab, a, b)
            + (t + 1) as f64 * hermite_expansion([i, j - 1, t + 1], ab, a, b)
    }
}

/// Hermite Coulomb auxiliary integral `R^n_{tuv}`. `pc` is the displacement
/// from the composite center `P` to the attraction point `C`.
pub(crate) fn coulomb_auxiliary(
    t: i32,
    u: i32,
    v: i32,
    n: i32,
    p: f64,
    pc: Vector3<f64>,
) -> f64 {
    if t < 0 || u < 0 || v < 0 {
        0.0
    } else if t == 0 && u == 0 && v == 0 {
        (-2.0 * p).powi(n) * boys(n as u64, p * pc.norm_squared())
    } else if t > 0 {
        (t - 1) as f64 * coulomb_auxiliary(t - 2, u, v, n + 1, p, pc)
            + pc.x * coulomb_auxiliary(t - 1, u, v, n + 1, p, pc)
    } else if u > 0 {
        (u - 1) as f64 * coulomb_auxiliary(t, u - 2, v, n + 1, p, pc)
            + pc.y * coulomb_auxiliary(t, u - 1, v, n + 1, p, pc)
    } else {
        (v - 1) as f64 * coulomb_auxiliary(t, u, v - 2, n + 1, p, pc)
            + pc.z * coulomb_auxiliary(t, u, v - 1, n + 1, p, pc)
    }
}

/// Composite center of two primitives.
#[inline(always)]
pub(crate) fn product_center(
    a_pos: Vector3<f64>,
    a_exp: f64,
    b_pos: Vector3<f64>,
    b_exp: f64,
) -> Vector3<f64> {
    (a_exp * a_pos + b_exp * b_pos) / (a_exp + b_exp)
}

/// Overlap of two primitives with Cartesian exponents `la`, `lb`.
pub(crate) fn primitive_overlap(
    la: [i32; 3],
    lb: [i32; 3],
    a: f64,
    b: f64,
    ab: Vector3<f64>,
) -> f64 {
    hermite_expansion([la[0], lb[0], 0], ab.x, a, b)
        * hermite_expansion([la[1], lb[1], 0], ab.y, a, b)
        * hermite_expansion([la[2], lb[2], 0], ab.z, a, b)
        * (std::f64::consts::PI / (a + b)).powi(3).sqrt()
}

/// Kinetic energy integral of two primitives, expressed through overlaps
/// with the ket angular momentum stepped by two.
pub(crate) fn primitive_kinetic(
    la: [i32; 3],
    lb: [i32; 3],
    a: f64,
    b: f64,
    ab: Vector3<f64>,
) -> f64 {
    let [l, m, n] = lb;
    let step = |i, j, k| primitive_overlap(la, [lb[0] + i, lb[1] + j, lb[2] + k], a, b, ab);

    let term_0 = b * (2 * (l + m + n) + 3) as f64 * primitive_overlap(la, lb, a, b, ab);
    let term_1 = -2.0 * b * b * (step(2, 0, 0) + step(0, 2, 0) + step(0, 0, 2));
    let term_2 = -0.5
        * ((l * (l - 1)) as f64 * step(-2, 0, 0)
            + (m * (m - 1)) as f64 * step(0, -2, 0)
            + (n * (n - 1)) as f64 * step(0, 0, -2));
    term_0 + term_1 + term_2
}

/// Coulomb interaction of the primitive product with a unit positive charge
/// at the point `P + pc`: `<a| 1/r_C |b>`. Callers scale by `-Z` for
/// nuclear attraction.
pub(crate) fn primitive_potential(
    la: [i32; 3],
    lb: [i32; 3],
    a: f64,
    b: f64,
    ab: Vector3<f64>,
    pc: Vector3<f64>,
) -> f64 {
    let p = a + b;

    let mut sum = 0.0;
    for (t, u, v) in itertools::iproduct!(0..=la[0] + lb[0], 0..=la[1] + lb[1], 0..=la[2] + lb[2])
    {
        let e1 = hermite_expansion([la[0], lb[0], t], ab.x, a, b);
        let e2 = hermite_expansion([la[1], lb[1], u], ab.y, a, b);
        let e3 = hermite_expansion([la[2], lb[2], v], ab.z, a, b);
        sum += e1 * e2 * e3 * coulomb_auxiliary(t, u, v, 0, p, pc);
    }
    std::f64::consts::TAU / p * sum
}

/// Gradient of [`primitive_potential`] with respect to the attraction point
/// coordinates, via stepped Hermite Coulomb indices.
pub(crate) fn primitive_potential_gradient(
    la: [i32; 3],
    lb: [i32; 3],
    a: f64,
    b: f64,
    ab: Vector3<f64>,
    pc: Vector3<f64>,
) -> Vector3<f64> {
    let p = a + b;

    let mut gradient = Vector3::zeros();
    for (t, u, v) in itertools::iproduct!(0..=la[0] + lb[0], 0..=la[1] + lb[1], 0..=la[2] + lb[2])
    {
        let e = hermite_expansion([la[0], lb[0], t], ab.x, a, b)
            * hermite_expansion([la[1], lb[1], u], ab.y, a, b)
            * hermite_expansion([la[2], lb[2], v], ab.z, a, b);

        // d/dC_x R_tuv = -R_(t+1)uv, and likewise for y, z
        gradient.x -= e * coulomb_auxiliary(t + 1, u, v, 0, p, pc);
        gradient.y -= e * coulomb_auxiliary(t, u + 1, v, 0, p, pc);
        gradient.z -= e * coulomb_auxiliary(t, u, v + 1, 0, p, pc);
    }
    std::f64::consts::TAU / p * gradient
}

/// Multipole moment integral `<a| prod_axis (r - C)^e |b>` for the order
/// triple `e`, by binomial expansion about the ket center.
pub(crate) fn primitive_multipole(
    la: [i32; 3],
    lb: [i32; 3],
    order: [i32; 3],
    a: f64,
    b: f64,
    ab: Vector3<f64>,
    b_to_origin: Vector3<f64>,
) -> f64 {
    let t = tables();
    let p = a + b;

    let mut value = (std::f64::consts::PI / p).powi(3).sqrt();
    for axis in 0..3 {
        let e = order[axis];
        let shift = -b_to_origin[axis]; // B - C component
        let mut axis_sum = 0.0;
        for k in 0..=e {
            axis_sum += t.bc[e as usize][k as usize]
                * shift.powi(e - k)
                * hermite_expansion([la[axis], lb[axis] + k, 0], ab[axis], a, b);
        }
        value *= axis_sum;
    }
    value
}

/// Overlap of three primitives via the generalized Gaussian product rule
/// and even-moment integration.
#[allow(clippy::too_many_arguments)]
pub(crate) fn primitive_three_center_overlap(
    la: [i32; 3],
    lb: [i32; 3],
    lc: [i32; 3],
    a: f64,
    b: f64,
    c: f64,
    pos_a: Vector3<f64>,
    pos_b: Vector3<f64>,
    pos_c: Vector3<f64>,
) -> f64 {
    let t = tables();
    let sigma = a + b + c;
    let center = (a * pos_a + b * pos_b + c * pos_c) / sigma;

    let ab = pos_a - pos_b;
    let ac = pos_a - pos_c;
    let bc = pos_b - pos_c;
    let prefactor = (-(a * b * ab.norm_squared()
        + a * c * ac.norm_squared()
        + b * c * bc.norm_squared())
        / sigma)
        .exp();

    let mut value = prefactor;
    for axis in 0..3 {
        let qa = center[axis] - pos_a[axis];
        let qb = center[axis] - pos_b[axis];
        let qc = center[axis] - pos_c[axis];
        let (i, j, k) = (la[axis] as usize, lb[axis] as usize, lc[axis] as usize);

        let mut axis_sum = 0.0;
        for (s, u, w) in itertools::iproduct!(0..=i, 0..=j, 0..=k) {
            let moment = s + u + w;
            if moment % 2 != 0 {
                continue;
            }
            axis_sum += t.bc[i][s]
                * t.bc[j][u]
                * t.bc[k][w]
                * qa.powi((i - s) as i32)
                * qb.powi((j - u) as i32)
                * qc.powi((k - w) as i32)
                * t.df[moment] / (2.0 * sigma).powi(moment as i32 / 2);
        }
        value *= axis_sum * (std::f64::consts::PI / sigma).sqrt();
    }
    value
}

/// Electron repulsion integral `(ab|cd)` over four primitives. `ab` and
/// `cd` are the in-pair displacements `A - B` and `C - D`; `pq` is the
/// displacement between the two composite centers, `P - Q`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn primitive_electron(
    la: [i32; 3],
    lb: [i32; 3],
    lc: [i32; 3],
    ld: [i32; 3],
    exponents: [f64; 4],
    ab: Vector3<f64>,
    cd: Vector3<f64>,
    pq: Vector3<f64>,
) -> f64 {
    let [a, b, c, d] = exponents;
    let p = a + b;
    let q = c + d;
    let alpha = p * q / (p + q);

    let mut sum = 0.0;
    for (t1, u1, v1) in
        itertools::iproduct!(0..=la[0] + lb[0], 0..=la[1] + lb[1], 0..=la[2] + lb[2])
    {
        let e1 = hermite_expansion([la[0], lb[0], t1], ab.x, a, b);
        let e2 = hermite_expansion([la[1], lb[1], u1], ab.y, a, b);
        let e3 = hermite_expansion([la[2], lb[2], v1], ab.z, a, b);
        let bra = e1 * e2 * e3;
        if bra == 0.0 {
            continue;
        }

        for (t2, u2, v2) in
            itertools::iproduct!(0..=lc[0] + ld[0], 0..=lc[1] + ld[1], 0..=lc[2] + ld[2])
        {
            let e4 = hermite_expansion([lc[0], ld[0], t2], cd.x, c, d);
            let e5 = hermite_expansion([lc[1], ld[1], u2], cd.y, c, d);
            let e6 = hermite_expansion([lc[2], ld[2], v2], cd.z, c, d);

            sum += bra
                * e4
                * e5
                * e6
                * coulomb_auxiliary(t1 + t2, u1 + u2, v1 + v2, 0, alpha, pq)
                * if (t2 + u2 + v2) % 2 == 0 { 1.0 } else { -1.0 };
        }
    }

    2.0 * std::f64::consts::PI.powi(5).sqrt() * (p * q * (p + q).sqrt()).recip() * sum
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const S: [i32; 3] = [0, 0, 0];

    #[test]
    fn hermite_base_case_is_gaussian_prefactor() {
        assert_relative_eq!(hermite_expansion([0, 0, 0], 0.0, 1.0, 1.0), 1.0);
        // K_ab = exp(-q AB^2) with q = ab/(a+b)
        assert_relative_eq!(
            hermite_expansion([0, 0, 0], 1.5, 2.0, 0.5),
            (-0.4 * 2.25f64).exp(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn s_overlap_matches_closed_form() {
        // <s_a | s_b> = (pi/p)^(3/2) exp(-q AB^2)
        let ab: Vector3<f64> = Vector3::new(0.5, -0.3, 0.1);
        let (a, b): (f64, f64) = (1.2, 0.8);
        let p = a + b;
        let q = a * b / p;
        let expected =
            (std::f64::consts::PI / p).powf(1.5) * (-q * ab.norm_squared()).exp();
        assert_relative_eq!(primitive_overlap(S, S, a, b, ab), expected, epsilon = 1e-13);
    }

    #[test]
    fn s_kinetic_matches_closed_form() {
        // concentric s primitives: T = 3 a b / p * (pi/p)^(3/2)
        let (a, b) = (0.9, 1.7);
        let p = a + b;
        let expected = 3.0 * a * b / p * (std::f64::consts::PI / p).powf(1.5);
        assert_relative_eq!(
            primitive_kinetic(S, S, a, b, Vector3::zeros()),
            expected,
            epsilon = 1e-13
        );
    }

    #[test]
    fn s_potential_at_center_matches_closed_form() {
        // <s|1/r|s> for a concentric product at the same point: 2 pi / p * F_0(0) = 2 pi / p
        let (a, b) = (0.6, 0.4);
        let p = a + b;
        assert_relative_eq!(
            primitive_potential(S, S, a, b, Vector3::zeros(), Vector3::zeros()),
            std::f64::consts::TAU / p,
            epsilon = 1e-13
        );
    }

    #[test]
    fn potential_gradient_matches_finite_difference() {
        let la = [1, 0, 0];
        let lb = [0, 1, 0];
        let (a, b) = (1.1, 0.7);
        let ab = Vector3::new(0.4, 0.2, -0.3);
        let pc = Vector3::new(0.3, -0.6, 0.5);

        let gradient = primitive_potential_gradient(la, lb, a, b, ab, pc);
        let h = 1e-6;
        for axis in 0..3 {
            let mut shift = Vector3::zeros();
            shift[axis] = h;
            // moving C by +h moves pc = P - C by -h
            let plus = primitive_potential(la, lb, a, b, ab, pc - shift);
            let minus = primitive_potential(la, lb, a, b, ab, pc + shift);
            assert_relative_eq!(gradient[axis], (plus - minus) / (2.0 * h), epsilon = 1e-6);
        }
    }

    #[test]
    fn multipole_order_zero_is_overlap() {
        let la = [1, 0, 2];
        let lb = [0, 1, 0];
        let (a, b) = (0.9, 1.3);
        let ab = Vector3::new(0.2, -0.1, 0.4);
        assert_relative_eq!(
            primitive_multipole(la, lb, [0, 0, 0], a, b, ab, Vector3::new(1.0, 2.0, 3.0)),
            primitive_overlap(la, lb, a, b, ab),
            epsilon = 1e-13
        );
    }

    #[test]
    fn s_dipole_about_product_center_vanishes() {
        // for concentric s primitives the (r - P) moment is odd
        let (a, b) = (1.0, 2.0);
        assert_relative_eq!(
            primitive_multipole(S, S, [1, 0, 0], a, b, Vector3::zeros(), Vector3::zeros()),
            0.0,
            epsilon = 1e-14
        );
    }

    #[test]
    fn three_center_overlap_reduces_to_two_center() {
        // an s primitive with zero exponent at the origin is the constant 1
        let la = [1, 0, 0];
        let lb = [0, 0, 1];
        let (a, b) = (0.8, 1.1);
        let pos_a = Vector3::new(0.1, 0.0, -0.2);
        let pos_b = Vector3::new(-0.3, 0.4, 0.0);

        let three = primitive_three_center_overlap(
            la,
            lb,
            S,
            a,
            b,
            1e-14,
            pos_a,
            pos_b,
            Vector3::zeros(),
        );
        let two = primitive_overlap(la, lb, a, b, pos_a - pos_b);
        assert_relative_eq!(three, two, epsilon = 1e-8);
    }

    #[test]
    fn s_eri_matches_closed_form() {
        // (ss|ss), all concentric: 2 pi^(5/2) / (p q sqrt(p + q))
        let e: [f64; 4] = [1.0, 1.0, 2.0, 0.5];
        let (p, q) = (e[0] + e[1], e[2] + e[3]);
        let expected =
            2.0 * std::f64::consts::PI.powf(2.5) / (p * q * (p + q).sqrt());
        assert_relative_eq!(
            primitive_electron(
                S,
                S,
                S,
                S,
                e,
                Vector3::zeros(),
                Vector3::zeros(),
                Vector3::zeros()
            ),
            expected,
            epsilon = 1e-12
        );
    }
}
