use bot_arena_backend::counter::{MatchIdCounter, now_ns};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
fn test_ids_start_at_the_seed() {
    let counter = MatchIdCounter::new(42);
    assert_eq!(counter.next(), 42);
    assert_eq!(counter.next(), 43);
    assert_eq!(counter.next(), 44);
}

#[test]
fn test_concurrent_ids_are_unique_and_dense() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 250;

    let counter = Arc::new(MatchIdCounter::new(1000));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || {
                (0..IDS_PER_THREAD)
                    .map(|_| counter.next())
                    .collect::<Vec<i64>>()
            })
        })
        .collect();

    let mut all_ids = Vec::new();
    for handle in handles {
        let ids = handle.join().expect("counter thread panicked");
        assert!(
            ids.windows(2).all(|w| w[0] < w[1]),
            "ids handed to one thread must be strictly increasing"
        );
        all_ids.extend(ids);
    }

    let unique: HashSet<_> = all_ids.iter().collect();
    assert_eq!(
        unique.len(),
        THREADS * IDS_PER_THREAD,
        "no id may be handed out twice"
    );
    assert_eq!(*all_ids.iter().min().unwrap(), 1000);
    assert_eq!(
        *all_ids.iter().max().unwrap(),
        1000 + (THREADS * IDS_PER_THREAD) as i64 - 1,
        "the allocator must not skip ids"
    );
}

#[test]
fn test_now_ns_is_monotone_enough_for_batch_ids() {
    let first = now_ns();
    let second = now_ns();
    assert!(first > 0, "wall clock should be past the epoch");
    assert!(second >= first);
}
