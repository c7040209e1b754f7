#![no_main]

use std::collections::HashSet as NatSet;
use std::iter::FromIterator;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use hashtrie::HashSet;

#[derive(Arbitrary, Debug)]
enum Action<A> {
    Insert(A),
    Remove(A),
    Toggle(A),
    Batch(Vec<(A, bool)>),
}

fuzz_target!(|actions: Vec<Action<u32>>| {
    let mut set = HashSet::new();
    let mut nat = NatSet::new();
    for action in actions {
        match action {
            Action::Insert(value) => {
                assert_eq!(nat.insert(value), set.insert(value));
            }
            Action::Remove(value) => {
                assert_eq!(nat.remove(&value), set.remove(&value));
            }
            Action::Toggle(value) => {
                if !nat.remove(&value) {
                    nat.insert(value);
                }
                set = set.toggle(value);
            }
            Action::Batch(changes) => {
                let before = set.clone();
                set = set.mutate(|s| {
                    for (value, keep) in &changes {
                        if *keep {
                            s.insert(*value);
                        } else {
                            s.remove(value);
                        }
                    }
                });
                for (value, keep) in changes {
                    if keep {
                        nat.insert(value);
                    } else {
                        nat.remove(&value);
                    }
                }
                before.assert_invariants();
                assert!(!set.is_editable());
            }
        }
        assert_eq!(nat.len(), set.len());
    }
    set.assert_invariants();
    assert_eq!(HashSet::from_iter(nat.iter().copied()), set);
    assert_eq!(NatSet::from_iter(set.iter().cloned()), nat);
    assert_eq!(set.iter().count(), nat.len());
    assert_eq!(set.into_iter().count(), nat.len());
});
