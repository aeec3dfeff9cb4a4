//! Language normalization seam.
//!
//! Language-code conversion and display-name lookup live in the surrounding
//! pipeline. The builders only need a hook that is invoked once per
//! descriptor, right before its metadata directives are emitted.

use crate::models::OutputTrack;

/// Collaborator that normalizes a descriptor's raw language tag and, where
/// the descriptor has no title, may supply a display name for it.
pub trait LanguageNormalizer {
    fn normalize(&self, track: &mut OutputTrack);
}

/// Leaves descriptors untouched; absent languages still render as "und".
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl LanguageNormalizer for Identity {
    fn normalize(&self, _track: &mut OutputTrack) {}
}

/// Adapter turning a plain function into a normalizer.
pub struct FnNormalizer<F>(pub F);

impl<F> LanguageNormalizer for FnNormalizer<F>
where
    F: Fn(&mut OutputTrack),
{
    fn normalize(&self, track: &mut OutputTrack) {
        (self.0)(track)
    }
}
