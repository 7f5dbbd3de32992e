use user_history::context::{ContextError, ContextTracker, ContextWord, NgramContext};

#[test]
fn invariant_empty_context_is_unigram_key() {
    let empty = NgramContext::empty();
    assert!(empty.is_empty());
    assert_eq!(empty, NgramContext::EMPTY);
    assert_eq!(empty.last_word(), None);
}

#[test]
fn invariant_next_appends_and_truncates_to_order() {
    let tracker = ContextTracker::new(2);
    let c1 = tracker.next(&NgramContext::EMPTY, "the");
    let c2 = tracker.next(&c1, "quick");
    let c3 = tracker.next(&c2, "fox");

    assert_eq!(c1, NgramContext::from_words(["the"]));
    assert_eq!(c2, NgramContext::from_words(["the", "quick"]));
    assert_eq!(c3, NgramContext::from_words(["quick", "fox"]));
    assert_eq!(c3.last_word(), Some("fox"));
}

#[test]
fn invariant_next_leaves_previous_context_untouched() {
    let base = NgramContext::from_words(["a", "b"]);
    let _next = base.next("c", 2);
    assert_eq!(base, NgramContext::from_words(["a", "b"]));
}

#[test]
fn invariant_order_one_keeps_only_latest_word() {
    let tracker = ContextTracker::new(1);
    let ctx = tracker.next(&NgramContext::from_words(["a"]), "b");
    assert_eq!(ctx, NgramContext::from_words(["b"]));
}

#[test]
fn invariant_beginning_of_sentence_differs_from_any_word() {
    let bos = NgramContext::beginning_of_sentence();
    assert_eq!(bos.words(), &[ContextWord::BeginningOfSentence]);
    assert_eq!(bos.last_word(), None);
    assert_ne!(bos, NgramContext::from_words(["<s>"]));

    let next = bos.next("hello", 2);
    assert_eq!(next.len(), 2);
    assert_eq!(next.to_string(), "[<s> hello]");
}

#[test]
fn invariant_over_long_context_is_rejected() {
    let ctx = NgramContext::from_words(["a", "b", "c"]);
    assert_eq!(
        ctx.check_order(2),
        Err(ContextError::TooLong {
            len: 3,
            max_order: 2
        })
    );
    assert!(ctx.check_order(3).is_ok());
}

#[test]
fn default_tracker_is_trigram() {
    assert_eq!(ContextTracker::default().max_order(), 2);
}
