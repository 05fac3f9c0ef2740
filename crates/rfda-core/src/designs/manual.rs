//! # Manual Entry
//!
//! A design class that designs nothing: it takes coefficients or
//! poles and zeros already sitting in the state, normalizes them and
//! fills in the derived representations. Comes in an FIR and an IIR
//! flavor so the capability tree advertises it under both kinds.

use crate::capability::{CapMap, CapNode, FieldState};
use crate::design::FilterDesign;
use crate::types::{
    BaCoeffs, DesignError, DesignMethod, DesignStatus, FilterKind, FilterState, OrderMode,
    ResponseType,
};

use super::poly_from_roots;

#[derive(Debug)]
pub struct Manual {
    kind: FilterKind,
}

impl Manual {
    pub fn fir() -> Self {
        Manual {
            kind: FilterKind::Fir,
        }
    }

    pub fn iir() -> Self {
        Manual {
            kind: FilterKind::Iir,
        }
    }

    /// Scale `ba` so the denominator is monic.
    fn normalize(&self, ba: &BaCoeffs) -> Result<BaCoeffs, DesignError> {
        if ba.b.is_empty() {
            return Err(DesignError::InvalidSpec(
                "numerator must hold at least one coefficient".into(),
            ));
        }
        let a0 = ba.a.first().copied().unwrap_or(1.0);
        if a0 == 0.0 {
            return Err(DesignError::InvalidSpec(
                "denominator must not start with zero".into(),
            ));
        }
        if self.kind == FilterKind::Fir && !ba.is_fir() {
            return Err(DesignError::InvalidSpec(
                "an FIR filter cannot carry denominator coefficients".into(),
            ));
        }
        let b = ba.b.iter().map(|c| c / a0).collect();
        let a = if ba.a.is_empty() {
            vec![1.0]
        } else {
            ba.a.iter().map(|c| c / a0).collect()
        };
        Ok(BaCoeffs::new(b, a))
    }
}

impl FilterDesign for Manual {
    fn name(&self) -> &'static str {
        match self.kind {
            FilterKind::Fir => "manual_fir",
            FilterKind::Iir => "manual_iir",
        }
    }

    fn display_name(&self) -> &'static str {
        match self.kind {
            FilterKind::Fir => "Manual FIR",
            FilterKind::Iir => "Manual IIR",
        }
    }

    fn description(&self) -> &'static str {
        "normalizes user-entered coefficients instead of designing"
    }

    fn kind(&self) -> FilterKind {
        self.kind
    }

    fn capabilities(&self) -> CapMap {
        let man = CapNode::map_of(&[
            ("fo", CapNode::entry(FieldState::Disabled, &["N"])),
            ("fspecs", CapNode::entry(FieldState::Unused, &["F_C"])),
            (
                "tspecs",
                CapNode::map_of(&[
                    ("frq", CapNode::entry(FieldState::Unused, &["F_PB", "F_SB"])),
                    ("amp", CapNode::entry(FieldState::Unused, &["A_PB", "A_SB"])),
                ]),
            ),
        ]);
        ResponseType::all()
            .iter()
            .map(|rt| {
                (
                    rt.as_str().to_string(),
                    CapNode::map_of(&[("man", man.clone())]),
                )
            })
            .collect()
    }

    fn design(
        &mut self,
        method: DesignMethod,
        state: &mut FilterState,
    ) -> Result<DesignStatus, DesignError> {
        if method.mode == OrderMode::Min {
            return Err(DesignError::UnsupportedMethod(method));
        }

        // Explicit coefficients win over a pole/zero set. The state is
        // only touched once the inputs have passed validation.
        if let Some(src) = &state.ba {
            let ba = self.normalize(src)?;
            state.clear_results();
            state.order = ba.order();
            state.ba = Some(ba);
            return Ok(DesignStatus::Completed);
        }

        if let Some(src) = &state.zpk {
            if self.kind == FilterKind::Fir && !src.p.is_empty() {
                return Err(DesignError::InvalidSpec(
                    "an FIR filter cannot carry poles".into(),
                ));
            }
            let b: Vec<f64> = poly_from_roots(&src.z)
                .into_iter()
                .map(|c| c * src.k)
                .collect();
            let a = poly_from_roots(&src.p);
            let ba = BaCoeffs::new(b, a);
            let zpk = src.clone();
            state.clear_results();
            state.order = ba.order();
            state.ba = Some(ba);
            state.zpk = Some(zpk);
            return Ok(DesignStatus::Completed);
        }

        Err(DesignError::InvalidSpec(
            "manual entry needs coefficients or poles and zeros in the state".into(),
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
