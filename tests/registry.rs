use std::sync::Arc;
use std::thread;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;
use user_history::{
    ContextTracker, DictionaryOptions, DictionaryRegistry, EmptyDistracterFilter, ManualClock,
    NgramContext, UserHistoryDictionary,
};

fn registry(dir: &std::path::Path) -> DictionaryRegistry {
    DictionaryRegistry::new(dir)
        .with_options(DictionaryOptions::default().with_clock(Arc::new(ManualClock::new(0))))
}

fn random_words(count: usize, rng: &mut StdRng) -> Vec<String> {
    (0..count)
        .map(|_| {
            let len = rng.gen_range(3..9);
            (0..len)
                .map(|_| rng.gen_range(b'a'..=b'z') as char)
                .collect::<String>()
        })
        .collect()
}

fn add_words(dict: &UserHistoryDictionary, words: &[String]) {
    let tracker = ContextTracker::default();
    let mut context = NgramContext::EMPTY;
    for word in words {
        dict.add_to_dictionary(&context, word, true, 0, &EmptyDistracterFilter);
        context = tracker.next(&context, word);
    }
}

#[test]
fn invariant_same_locale_same_store() {
    let dir = tempdir().unwrap();
    let registry = registry(dir.path());

    let a = registry.get("en_US").unwrap();
    let b = registry.get("en_US").unwrap();
    let c = registry.get(" en_US ").unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
    assert_eq!(registry.locales(), vec!["en_US".to_string()]);
}

#[test]
fn invariant_get_does_not_touch_disk() {
    let dir = tempdir().unwrap();
    let registry = registry(dir.path());

    let dict = registry.get("fr").unwrap();
    assert!(!dict.is_loaded());
    assert!(!dict.path().exists());
    assert!(registry.contains("fr"));
}

#[test]
fn invariant_locales_are_isolated() {
    let dir = tempdir().unwrap();
    let registry = registry(dir.path());

    let en = registry.get("en").unwrap();
    let de = registry.get("de").unwrap();
    en.add_to_dictionary(&NgramContext::EMPTY, "hello", true, 0, &EmptyDistracterFilter);
    de.add_to_dictionary(&NgramContext::EMPTY, "hallo", true, 0, &EmptyDistracterFilter);

    assert!(en.is_in_dictionary("hello"));
    assert!(!en.is_in_dictionary("hallo"));
    assert!(de.is_in_dictionary("hallo"));
    assert!(!de.is_in_dictionary("hello"));
    assert_ne!(en.path(), de.path());
}

#[test]
fn invariant_evict_closes_before_forgetting() {
    let dir = tempdir().unwrap();
    let registry = registry(dir.path());

    let path = {
        let dict = registry.get("en").unwrap();
        dict.add_to_dictionary(&NgramContext::EMPTY, "kept", true, 0, &EmptyDistracterFilter);
        dict.path().to_path_buf()
    };

    assert!(registry.evict("en"));
    assert!(!registry.evict("en"));
    assert!(path.exists());

    let dict = registry.get("en").unwrap();
    assert!(dict.is_in_dictionary("kept"));
}

#[test]
fn suffix_isolates_files() {
    let dir = tempdir().unwrap();
    let plain = registry(dir.path());
    let isolated = DictionaryRegistry::new(dir.path()).with_suffix("profile");

    let a = plain.get("en").unwrap();
    let b = isolated.get("en").unwrap();
    assert_eq!(a.path().file_name().unwrap(), "UserHistory.en.dict");
    assert_eq!(b.path().file_name().unwrap(), "UserHistory.en.profile.dict");
}

#[test]
fn stress_switching_languages_and_adding_words() {
    let dir = tempdir().unwrap();
    let registry = registry(dir.path());
    let locales = ["switching_languages0", "switching_languages1"];
    let mut rng = StdRng::seed_from_u64(123456);

    for locale in locales {
        let dict = registry.get(locale).unwrap();
        dict.clear();
        dict.close();
    }

    let mut last_batch = vec![Vec::new(), Vec::new()];
    for i in 0..40 {
        let index = i % locales.len();
        let dict = registry.get(locales[index]).unwrap();
        let words = random_words(100, &mut rng);
        add_words(&dict, &words);
        dict.close();
        last_batch[index] = words;
    }

    registry.close_all();
    for (index, locale) in locales.iter().enumerate() {
        let dict = registry.get(locale).unwrap();
        assert!(dict.path().exists());
        for word in &last_batch[index] {
            assert!(dict.is_in_dictionary(word), "{word} missing from {locale}");
        }
    }
}

#[test]
fn invariant_concurrent_locales_do_not_interfere() {
    let dir = tempdir().unwrap();
    let registry = Arc::new(registry(dir.path()));

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let dict = registry.get(&format!("locale{n}")).unwrap();
                for i in 0..200 {
                    dict.add_to_dictionary(
                        &NgramContext::EMPTY,
                        &format!("l{n}w{i}"),
                        true,
                        0,
                        &EmptyDistracterFilter,
                    );
                }
                dict.close();
                dict.wait_all_tasks();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for n in 0..4 {
        let dict = registry.get(&format!("locale{n}")).unwrap();
        assert_eq!(dict.entry_count(), 200);
        assert!(!dict.is_in_dictionary(&format!("l{}w0", (n + 1) % 4)));
    }
}
