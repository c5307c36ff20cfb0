use crate::config::{
    FOCAL_REL_START, MAX_PCT_SENTINEL, MAX_WIDTH_BP, MIN_PCT_SENTINEL, QUERY_WIDTH_RESERVED,
};
use crate::error::GndError;
use crate::model::{Bounds, DiagramElement};

/// Only a finite, positive scale factor yields a usable window.
pub fn check_scale_factor(scale_factor: f64) -> Result<f64, GndError> {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        Ok(scale_factor)
    } else {
        Err(GndError::InvalidParam {
            name: "scale-factor",
            value: scale_factor.to_string(),
        })
    }
}

/// Project every element onto a shared 0..1 scale centered on its focal gene.
///
/// The visible window is `MAX_WIDTH_BP / scale_factor` base pairs wide. Each
/// focal gene starts at 0.5 and its neighbors are shifted by the same offset,
/// so diagrams line up on the focal start regardless of where it sits in the
/// genome.
pub fn transform(elements: &mut [DiagramElement], scale_factor: f64) -> Result<Bounds, GndError> {
    let scale_factor = check_scale_factor(scale_factor)?;
    let max_width = MAX_WIDTH_BP / scale_factor;
    let max_side = max_width / 2.0;
    let min_bp = -max_side;
    let max_bp = max_side + QUERY_WIDTH_RESERVED;

    let mut min_pct = MIN_PCT_SENTINEL;
    let mut max_pct = MAX_PCT_SENTINEL;

    for elem in elements.iter_mut() {
        let attrs = &mut elem.attributes;
        let start = attrs.rel_start_coord;
        let width = (attrs.rel_stop_coord - start) / max_width;
        let offset = FOCAL_REL_START - (start - min_bp) / max_width;
        attrs.rel_start = FOCAL_REL_START;
        attrs.rel_width = width;
        max_pct = max_pct.max(FOCAL_REL_START + width);
        min_pct = min_pct.min(FOCAL_REL_START);

        for neighbor in elem.neighbors.iter_mut() {
            let nb_start = (neighbor.rel_start_coord - min_bp) / max_width + offset;
            let nb_width = (neighbor.rel_stop_coord - neighbor.rel_start_coord) / max_width;
            neighbor.rel_start = nb_start;
            neighbor.rel_width = nb_width;
            max_pct = max_pct.max(nb_start + nb_width);
            min_pct = min_pct.min(nb_start);
        }
    }

    Ok(Bounds {
        legend_scale: max_width,
        min_pct,
        max_pct,
        min_bp,
        max_bp,
        scale_factor,
    })
}
