//! iCE40 PLL parameter search
//!
//! Exhaustive search over the DIVR/DIVF/DIVQ dividers of the iCE40 PLL in
//! simple feedback mode, keeping the combination whose output is closest to
//! the requested frequency. All frequencies are in Hz.

use serde::Serialize;

use crate::error::{BuildError, Result};

const F_IN_RANGE: (f64, f64) = (10e6, 133e6);
const F_OUT_RANGE: (f64, f64) = (16e6, 275e6);
const F_PFD_RANGE: (f64, f64) = (10e6, 133e6);
const F_VCO_RANGE: (f64, f64) = (533e6, 1066e6);
/// DIVF reaches 127 in simple feedback mode
const DIVF_MAX: u32 = 128;

fn within(f: f64, (lo, hi): (f64, f64)) -> bool {
    (lo..=hi).contains(&f)
}

/// Solved PLL configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PllParams {
    pub f_in: f64,
    pub req_f_out: f64,
    pub divr: u32,
    pub divf: u32,
    pub divq: u32,
    pub f_pfd: f64,
    pub f_out: f64,
    pub filter_range: u32,
    pub feedback_path: &'static str,
    /// Output error relative to the request
    pub ppm: f64,
}

impl PllParams {
    pub fn solve(f_in: f64, req_f_out: f64) -> Result<Self> {
        if !within(f_in, F_IN_RANGE) {
            return Err(BuildError::PllInputOutOfRange(f_in / 1e6));
        }
        if !within(req_f_out, F_OUT_RANGE) {
            return Err(BuildError::PllOutputOutOfRange(req_f_out / 1e6));
        }

        let mut best: Option<(u32, u32, u32, f64, f64)> = None;
        for divr in 0..16 {
            let f_pfd = f_in / f64::from(divr + 1);
            if !within(f_pfd, F_PFD_RANGE) {
                continue;
            }
            for divf in 0..DIVF_MAX {
                let f_vco = f_pfd * f64::from(divf + 1);
                if !within(f_vco, F_VCO_RANGE) {
                    continue;
                }
                for divq in 1..7 {
                    let f_out = f_vco / f64::from(1u32 << divq);
                    let closer = match best {
                        Some((.., prev)) => (f_out - req_f_out).abs() < (prev - req_f_out).abs(),
                        None => true,
                    };
                    if closer {
                        best = Some((divr, divf, divq, f_pfd, f_out));
                    }
                }
            }
        }

        let (divr, divf, divq, f_pfd, f_out) = best.ok_or(BuildError::PllUnsolvable {
            f_in: f_in / 1e6,
            f_out: req_f_out / 1e6,
        })?;

        let params = Self {
            f_in,
            req_f_out,
            divr,
            divf,
            divq,
            f_pfd,
            f_out,
            filter_range: filter_range(f_pfd),
            feedback_path: "SIMPLE",
            ppm: (req_f_out - f_out).abs() / req_f_out * 1e6,
        };
        tracing::debug!(
            "pll {:.3} MHz -> {:.3} MHz (divr {} divf {} divq {}, {:.0} ppm)",
            f_in / 1e6,
            f_out / 1e6,
            divr,
            divf,
            divq,
            params.ppm
        );
        Ok(params)
    }
}

/// Loop filter setting for a phase detector frequency
fn filter_range(f_pfd: f64) -> u32 {
    let mhz = f_pfd / 1e6;
    match mhz {
        m if m < 17.0 => 1,
        m if m < 26.0 => 2,
        m if m < 44.0 => 3,
        m if m < 66.0 => 4,
        m if m < 101.0 => 5,
        _ => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vga_from_12mhz() {
        let p = PllParams::solve(12e6, 25.175e6).unwrap();
        assert_eq!((p.divr, p.divf, p.divq), (0, 66, 5));
        assert!((p.f_out - 25.125e6).abs() < 1.0);
        assert_eq!(p.filter_range, 1);
        assert!(p.ppm < 2000.0);
    }

    #[test]
    fn test_output_respects_vco_and_pfd() {
        for (f_in, f_out) in [(12e6, 33.33e6), (16e6, 27.686e6), (16e6, 25.175e6)] {
            let p = PllParams::solve(f_in, f_out).unwrap();
            let f_vco = p.f_pfd * f64::from(p.divf + 1);
            assert!(within(f_vco, F_VCO_RANGE));
            assert!(within(p.f_pfd, F_PFD_RANGE));
            assert!((p.f_out - f_vco / f64::from(1u32 << p.divq)).abs() < 1e-3);
            // the 12 MHz boards only get within about 1%
            assert!(p.ppm < 20_000.0, "{} ppm", p.ppm);
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(
            PllParams::solve(5e6, 25e6),
            Err(BuildError::PllInputOutOfRange(5.0))
        );
        assert_eq!(
            PllParams::solve(12e6, 300e6),
            Err(BuildError::PllOutputOutOfRange(300.0))
        );
    }

    #[test]
    fn test_filter_range_in_mhz() {
        assert_eq!(filter_range(12e6), 1);
        assert_eq!(filter_range(16e6), 1);
        assert_eq!(filter_range(20e6), 2);
        assert_eq!(filter_range(120e6), 6);
    }
}
