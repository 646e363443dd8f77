//! Module `boxscan` implements the range-scan engine: the box-membership
//! predicate `is_relevant` and the litmax/bigmin `get_next_zvalue` jump.
//!
//! Ported bit-for-bit from `examples/original_source/src/lib/salad/zcurve.c`
//! (`z_value_is_relevant`, `get_next_zvalue`), the Tropf & Herzog
//! litmax/bigmin construction. The C source tracks per-dimension state in
//! parallel `int8_t flag[]`/`int16_t save_min[]`/`save_max[]` arrays indexed
//! by dimension; this module keeps the same per-dimension arrays but
//! resolves the lo-side and hi-side of each dimension independently (once a
//! dimension's relation to `lo` or to `hi` is settled at the most
//! significant differing bit, later, less significant bits must not
//! overwrite it).

use crate::bitvec::BitVec;

/// `dim` and `step` decomposition of an overall bit position, per spec
/// §4.E: `dim = bp mod d`, `step = bp div d`.
#[inline]
fn dim_of(bp: usize, dim: usize) -> usize {
    bp % dim
}

/// True iff `lane_i(lo) <= lane_i(z) <= lane_i(hi)` for every dimension
/// `i`, tested directly on the interleaved bits (spec §4.E.1).
pub fn is_relevant(z: &BitVec, lo: &BitVec, hi: &BitVec, dim: usize) -> bool {
    debug_assert_eq!(z.word_len(), dim);
    debug_assert_eq!(lo.word_len(), dim);
    debug_assert_eq!(hi.word_len(), dim);

    let full_mask: u32 = (1u32 << dim) - 1;
    let mut save_min: u32 = 0;
    let mut save_max: u32 = 0;

    for w in (0..z.word_len()).rev() {
        if z.word(w) == lo.word(w) && z.word(w) == hi.word(w) {
            continue;
        }
        for bit in (0..64).rev() {
            let bp = w * 64 + bit;
            let d = dim_of(bp, dim);
            let mask = 1u32 << d;
            let zb = z.get(bp);
            let lob = lo.get(bp);
            let hib = hi.get(bp);
            if zb == lob && zb == hib {
                continue;
            }
            if save_min & mask == 0 && zb != lob {
                if zb {
                    save_min |= mask;
                } else {
                    return false;
                }
            }
            if save_max & mask == 0 && zb != hib {
                if !zb {
                    save_max |= mask;
                } else {
                    return false;
                }
            }
            if save_min == full_mask && save_max == full_mask {
                return true;
            }
        }
    }
    true
}

/// Smallest Z-address `z* >= z` with `is_relevant(z*, lo, hi)` true, given
/// `is_relevant(z, lo, hi)` false and `lo <= z <= hi` (spec §4.E.2).
///
/// If no such `z*` exists at or below `hi`, returns a clone of `hi` — callers
/// detect termination by comparing the result against `hi`.
pub fn get_next_zvalue(z: &BitVec, lo: &BitVec, hi: &BitVec, dim: usize) -> BitVec {
    debug_assert_eq!(z.word_len(), dim);
    let total_bits = z.bit_len();

    // `flag[d]`: -1 once z's lane is known below lo, +1 once known above hi.
    let mut flag = vec![0i8; dim];
    // step at which the lo-side / hi-side divergence was first observed.
    let mut save_min: Vec<Option<usize>> = vec![None; dim];
    let mut save_max: Vec<Option<usize>> = vec![None; dim];
    let mut lo_resolved = vec![false; dim];
    let mut hi_resolved = vec![false; dim];
    // (bp, dim) of the very first flag set while scanning high to low —
    // by construction of the descending scan this is the dimension with
    // the largest `out_step` (spec's post-scan max search).
    let mut first_flag: Option<(usize, usize)> = None;

    for w in (0..z.word_len()).rev() {
        if z.word(w) == lo.word(w) && z.word(w) == hi.word(w) {
            continue;
        }
        for bit in (0..64).rev() {
            let bp = w * 64 + bit;
            let d = dim_of(bp, dim);
            if lo_resolved[d] && hi_resolved[d] {
                continue;
            }
            let step = bp / dim;
            let zb = z.get(bp);
            let lob = lo.get(bp);
            let hib = hi.get(bp);

            if !lo_resolved[d] && zb != lob {
                lo_resolved[d] = true;
                if zb {
                    save_min[d] = Some(step);
                } else {
                    flag[d] = -1;
                    if first_flag.is_none() {
                        first_flag = Some((bp, d));
                    }
                }
            }
            if !hi_resolved[d] && zb != hib {
                hi_resolved[d] = true;
                if !zb {
                    save_max[d] = Some(step);
                } else {
                    flag[d] = 1;
                    if first_flag.is_none() {
                        first_flag = Some((bp, d));
                    }
                }
            }
        }
    }

    let (mut max_bp, max_dim) = match first_flag {
        Some((bp, d)) => (bp, d),
        None => return hi.clone(),
    };

    if flag[max_dim] == 1 {
        for bp in (max_bp + 1)..total_bits {
            let d = dim_of(bp, dim);
            let step = bp / dim;
            if let Some(smax) = save_max[d] {
                if step <= smax && !z.get(bp) {
                    max_bp = bp;
                    save_min[d] = Some(step);
                    flag[d] = 0;
                    break;
                }
            }
        }
    }

    let mut out = z.clone();
    for d in 0..dim {
        if flag[d] >= 0 {
            let keep_tail_from_z = match save_min[d] {
                Some(smin) => max_bp <= dim * smin + d,
                None => false,
            };
            let mut p = d;
            while p < max_bp {
                if keep_tail_from_z {
                    out.clear(p);
                } else {
                    out.assign(p, lo.get(p));
                }
                p += dim;
            }
        } else {
            let mut p = d;
            while p < total_bits {
                out.assign(p, lo.get(p));
                p += dim;
            }
        }
    }
    out.set(max_bp);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a 2-word [`BitVec`] whose two lanes (64 bits each) are `a`
    /// (dimension 0) and `b` (dimension 1), interleaved the way
    /// `interleave::InterleaveTables` does: lane `k`'s bit `s` lands at
    /// position `s*dim + k`.
    fn pack2(a: u64, b: u64) -> BitVec {
        let mut v = BitVec::zeros(2);
        for s in 0..64 {
            if (a >> s) & 1 == 1 {
                v.set(s * 2);
            }
            if (b >> s) & 1 == 1 {
                v.set(s * 2 + 1);
            }
        }
        v
    }

    fn pack3(a: u64, b: u64, c: u64) -> BitVec {
        let mut v = BitVec::zeros(3);
        for s in 0..64 {
            if (a >> s) & 1 == 1 {
                v.set(s * 3);
            }
            if (b >> s) & 1 == 1 {
                v.set(s * 3 + 1);
            }
            if (c >> s) & 1 == 1 {
                v.set(s * 3 + 2);
            }
        }
        v
    }

    fn unpack2(v: &BitVec) -> (u64, u64) {
        let mut a = 0u64;
        let mut b = 0u64;
        for s in 0..64 {
            if v.get(s * 2) {
                a |= 1 << s;
            }
            if v.get(s * 2 + 1) {
                b |= 1 << s;
            }
        }
        (a, b)
    }

    /// Seed scenario 1 (spec §8.2 #1): d=2, lo=4, hi=51 as Z-order integers.
    #[test]
    fn seed_scenario_1_is_relevant() {
        // lo=4 -> (2,0); hi=51 -> (5,5) per the interleaving in §4.B.
        let lo = pack2(2, 0);
        let hi = pack2(5, 5);
        let expected_true = [4u64, 7, 12, 19, 24, 51];
        let expected_false = [0u64, 8, 11, 20, 23, 35, 47, 52];
        for &zi in expected_true.iter() {
            let z = morton2(zi);
            assert!(
                is_relevant(&z, &lo, &hi, 2),
                "expected {} to be relevant",
                zi
            );
        }
        for &zi in expected_false.iter() {
            let z = morton2(zi);
            assert!(
                !is_relevant(&z, &lo, &hi, 2),
                "expected {} to NOT be relevant",
                zi
            );
        }
    }

    /// Build the `BitVec` whose interleaved integer value (low 6 bits) is
    /// `zi`, matching the "Z-address displayed as its interleaved integer"
    /// convention of spec §8.2.
    fn morton2(zi: u64) -> BitVec {
        let mut v = BitVec::zeros(2);
        for bp in 0..6 {
            if (zi >> bp) & 1 == 1 {
                v.set(bp as usize);
            }
        }
        v
    }

    /// Seed scenario 2 (spec §8.2 #2): d=2, lo=11, hi=50.
    #[test]
    fn seed_scenario_2_get_next_zvalue() {
        let lo = morton2(11);
        let hi = morton2(50);
        let cases: &[(u64, u64)] = &[
            (12, 14),
            (13, 14),
            (17, 26),
            (25, 26),
            (27, 33),
            (34, 35),
            (40, 48),
            (49, 50),
        ];
        for &(zi, expect) in cases {
            let z = morton2(zi);
            assert!(!is_relevant(&z, &lo, &hi, 2), "z={} must not be relevant", zi);
            let next = get_next_zvalue(&z, &lo, &hi, 2);
            let got = to_int(&next);
            assert_eq!(got, expect, "get_next_zvalue({}) = {}, want {}", zi, got, expect);
        }
    }

    fn to_int(v: &BitVec) -> u64 {
        let mut out = 0u64;
        for bp in 0..6 {
            if v.get(bp) {
                out |= 1 << bp;
            }
        }
        out
    }

    /// Seed scenario 3 (spec §8.2 #3): d=3, lo=(1,1,1), hi=(9,9,9).
    #[test]
    fn seed_scenario_3_is_relevant_3d() {
        let lo = pack3(1, 1, 1);
        let hi = pack3(9, 9, 9);
        let points: &[((u64, u64, u64), bool)] = &[
            ((0, 1, 1), false),
            ((1, 0, 1), false),
            ((1, 1, 0), false),
            ((5, 5, 5), true),
            ((1, 2, 3), true),
            ((9, 10, 11), false),
            ((9, 9, 10), false),
            ((4, 4, 20), false),
        ];
        for &((a, b, c), expect) in points {
            let z = pack3(a, b, c);
            assert_eq!(
                is_relevant(&z, &lo, &hi, 3),
                expect,
                "point ({},{},{})",
                a,
                b,
                c
            );
        }
    }

    #[test]
    fn fuzz_is_relevant_matches_naive_lane_compare() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let dim = 2;
            let lo_lanes = [rng.gen::<u64>() % 1000, rng.gen::<u64>() % 1000];
            let hi_lanes = [
                lo_lanes[0] + rng.gen::<u64>() % 1000,
                lo_lanes[1] + rng.gen::<u64>() % 1000,
            ];
            let z_lanes = [
                lo_lanes[0] + rng.gen::<u64>() % (hi_lanes[0] - lo_lanes[0] + 1),
                lo_lanes[1] + rng.gen::<u64>() % (hi_lanes[1] - lo_lanes[1] + 1),
            ];
            let lo = pack2(lo_lanes[0], lo_lanes[1]);
            let hi = pack2(hi_lanes[0], hi_lanes[1]);
            let z = pack2(z_lanes[0], z_lanes[1]);
            let naive = (lo_lanes[0]..=hi_lanes[0]).contains(&z_lanes[0])
                && (lo_lanes[1]..=hi_lanes[1]).contains(&z_lanes[1]);
            assert_eq!(is_relevant(&z, &lo, &hi, dim), naive);
        }
    }

    #[test]
    fn fuzz_get_next_zvalue_matches_brute_force() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let mut tried = 0;
        while tried < 200 {
            let lo_lanes = [rng.gen::<u64>() % 20, rng.gen::<u64>() % 20];
            let hi_lanes = [lo_lanes[0] + rng.gen::<u64>() % 20, lo_lanes[1] + rng.gen::<u64>() % 20];
            let z_lanes = [
                lo_lanes[0] + rng.gen::<u64>() % (hi_lanes[0] - lo_lanes[0] + 1),
                lo_lanes[1] + rng.gen::<u64>() % (hi_lanes[1] - lo_lanes[1] + 1),
            ];
            let lo = pack2(lo_lanes[0], lo_lanes[1]);
            let hi = pack2(hi_lanes[0], hi_lanes[1]);
            let z = pack2(z_lanes[0], z_lanes[1]);
            if is_relevant(&z, &lo, &hi, 2) {
                continue; // precondition requires non-relevant z
            }
            tried += 1;
            let got = get_next_zvalue(&z, &lo, &hi, 2);
            assert!(got > z, "next must be > z");

            // brute force smallest z'' > z that is_relevant, scanning the
            // interleaved integer space up to hi's integer value.
            let z_int = interleaved_u128(&z);
            let hi_int = interleaved_u128(&hi);
            let mut want = None;
            let mut cand = z_int + 1;
            while cand <= hi_int {
                let cv = from_interleaved_u128(cand);
                if is_relevant(&cv, &lo, &hi, 2) {
                    want = Some(cand);
                    break;
                }
                cand += 1;
            }
            if let Some(w) = want {
                assert_eq!(interleaved_u128(&got), w);
            }
        }
    }

    fn interleaved_u128(v: &BitVec) -> u128 {
        let mut out = 0u128;
        for bp in 0..14 {
            if v.get(bp) {
                out |= 1u128 << bp;
            }
        }
        out
    }

    fn from_interleaved_u128(x: u128) -> BitVec {
        let mut v = BitVec::zeros(2);
        for bp in 0..14 {
            if (x >> bp) & 1 == 1 {
                v.set(bp as usize);
            }
        }
        v
    }

    #[test]
    fn unpack_roundtrip_sanity() {
        let v = pack2(0b101, 0b011);
        assert_eq!(unpack2(&v), (0b101, 0b011));
    }
}
