#![no_main]

use std::collections::HashMap as NatMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use hashtrie::HashMap;

#[derive(Arbitrary, Debug)]
enum Action<K, V> {
    Insert(K, V),
    Remove(K),
    Set(K, V),
    Without(K),
    Batch(Vec<(K, Option<V>)>),
}

fuzz_target!(|actions: Vec<Action<u16, u8>>| {
    let mut map = HashMap::new();
    let mut nat = NatMap::new();
    for action in actions {
        match action {
            Action::Insert(key, value) => {
                assert_eq!(nat.insert(key, value), map.insert(key, value));
            }
            Action::Remove(key) => {
                assert_eq!(nat.remove(&key), map.remove(&key));
            }
            Action::Set(key, value) => {
                let old = map.clone();
                map = map.set(key, value);
                nat.insert(key, value);
                assert_eq!(old.len() + usize::from(!old.contains_key(&key)), map.len());
            }
            Action::Without(key) => {
                let old = map.clone();
                map = map.without(&key);
                nat.remove(&key);
                assert_eq!(old.len() - usize::from(old.contains_key(&key)), map.len());
            }
            Action::Batch(changes) => {
                let before = map.clone();
                map = map.mutate(|m| {
                    for (key, value) in &changes {
                        m.alter(*key, |_| *value);
                    }
                });
                for (key, value) in changes {
                    match value {
                        Some(value) => nat.insert(key, value),
                        None => nat.remove(&key),
                    };
                }
                before.assert_invariants();
            }
        }
        assert_eq!(nat.len(), map.len());
    }
    map.assert_invariants();
    for (key, value) in &nat {
        assert_eq!(Some(value), map.get(key));
    }
    assert_eq!(map.iter().count(), nat.len());
    assert_eq!(map.into_iter().count(), nat.len());
});
