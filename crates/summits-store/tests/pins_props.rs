//! Property tests for pinned aims

use proptest::prelude::*;
use std::sync::Arc;
use summits_store::{KeyValueStore, MemoryStore, Pins};
use summits_test_utils::{account, address};

proptest! {
    #[test]
    fn pins_reload_in_pin_order(ops in prop::collection::vec((any::<bool>(), 1u64..20), 0..40)) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut pins = Pins::load(store.clone(), "localnet", &account()).unwrap();
        let mut expected: Vec<u64> = Vec::new();

        for (pin, n) in ops {
            if pin {
                let added = pins.pin(address(n)).unwrap();
                prop_assert_eq!(added, !expected.contains(&n));
                if added {
                    expected.push(n);
                }
            } else {
                let removed = pins.unpin(&address(n)).unwrap();
                prop_assert_eq!(removed, expected.contains(&n));
                expected.retain(|&e| e != n);
            }
        }

        let reloaded = Pins::load(store, "localnet", &account()).unwrap();
        let got: Vec<_> = reloaded.iter().cloned().collect();
        let want: Vec<_> = expected.into_iter().map(address).collect();
        prop_assert_eq!(got, want);
    }
}
