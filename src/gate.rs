use crate::context::NgramContext;

/// Vetoes learning of words that are not worth storing, for example words
/// the main dictionary already predicts from the same context.
pub trait DistracterFilter: Send + Sync {
    /// `true` means skip the word.
    fn is_distracter(&self, context: &NgramContext, word: &str) -> bool;
}

/// Lets every word through.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyDistracterFilter;

impl DistracterFilter for EmptyDistracterFilter {
    fn is_distracter(&self, _context: &NgramContext, _word: &str) -> bool {
        false
    }
}

impl<F> DistracterFilter for F
where
    F: Fn(&NgramContext, &str) -> bool + Send + Sync,
{
    fn is_distracter(&self, context: &NgramContext, word: &str) -> bool {
        self(context, word)
    }
}
