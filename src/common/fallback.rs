//! Ordered fallback chains.
//!
//! Lookup candidates, download mirrors, service aliases and alias commands are
//! all "try each in order, stop at the first success" loops. They share
//! [`try_each`].

use std::ops::ControlFlow;

/// Outcome of a chain where no attempt succeeded.
#[derive(Debug)]
pub enum Exhausted<E> {
    /// The chain had no entries, nothing was attempted.
    Empty,
    /// Every entry failed; holds the failure of the last one.
    Failed(E),
}

/// Run `attempt` on each item in order until one succeeds.
///
/// Failures before the first success are passed to `on_failure` and then
/// dropped. `on_failure` returning `Break` ends the chain with that failure.
/// If every item fails, the last failure is returned.
pub fn try_each<I, T, E, F, L>(
    items: I,
    mut attempt: F,
    mut on_failure: L,
) -> Result<T, Exhausted<E>>
where
    I: IntoIterator,
    F: FnMut(&I::Item) -> Result<T, E>,
    L: FnMut(&I::Item, &E) -> ControlFlow<()>,
{
    let mut last = None;
    for item in items {
        match attempt(&item) {
            Ok(value) => return Ok(value),
            Err(e) => {
                if on_failure(&item, &e).is_break() {
                    return Err(Exhausted::Failed(e));
                }
                last = Some(e);
            }
        }
    }

    Err(match last {
        Some(e) => Exhausted::Failed(e),
        None => Exhausted::Empty,
    })
}

/// Return the first item for which `probe` yields a value.
///
/// Used where a miss is not a failure (presence probing).
pub fn first_hit<I, T, F>(items: I, probe: F) -> Option<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Option<T>,
{
    items.into_iter().find_map(probe)
}
