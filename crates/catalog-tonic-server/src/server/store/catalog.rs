//! In-memory laptop store.
//!
//! The backing map is guarded by a single reader/writer lock: `find` and
//! `search` run concurrently, `save` excludes everything else. Records are
//! deep-copied on the way in and on the way out so no caller ever aliases
//! the store's internal state.

use crate::server::context::CallContext;
use catalog_tonic_core::proto::{Laptop, LaptopFilter, Memory, memory::Unit};
use catalog_tonic_core::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Storage interface for catalog entries.
///
/// Implementations must be safe for concurrent use and must never hand out
/// a reference into their own state; every value crossing the boundary is a
/// copy.
pub trait LaptopStore: Send + Sync {
    /// Stores a copy of the laptop.
    ///
    /// Fails with [`Error::AlreadyExists`] when the id is already present;
    /// the stored record is left untouched in that case.
    fn save(&self, laptop: &Laptop) -> Result<()>;

    /// Returns a copy of the laptop with this id, or `None`.
    ///
    /// A missing id is not an error.
    fn find(&self, id: &str) -> Option<Laptop>;

    /// Scans all laptops, invoking `found` with a copy of each match.
    ///
    /// `ctx` is checked before each entry is compared; the scan aborts with
    /// [`Error::Cancelled`] or [`Error::DeadlineExceeded`] as soon as the
    /// caller context is dead, so a dead caller never pins the read lock.
    /// An error returned by `found` aborts the scan and propagates
    /// unchanged.
    fn search(
        &self,
        ctx: &CallContext,
        filter: &LaptopFilter,
        found: &mut dyn FnMut(Laptop) -> Result<()>,
    ) -> Result<()>;
}

/// In-memory [`LaptopStore`].
#[derive(Default)]
pub struct InMemoryLaptopStore {
    data: RwLock<HashMap<String, Laptop>>,
}

impl InMemoryLaptopStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LaptopStore for InMemoryLaptopStore {
    fn save(&self, laptop: &Laptop) -> Result<()> {
        let mut data = self.data.write();
        if data.contains_key(&laptop.id) {
            return Err(Error::AlreadyExists {
                id: laptop.id.clone(),
            });
        }

        // Deep copy: the caller keeps no alias into the map.
        data.insert(laptop.id.clone(), laptop.clone());
        Ok(())
    }

    fn find(&self, id: &str) -> Option<Laptop> {
        self.data.read().get(id).cloned()
    }

    fn search(
        &self,
        ctx: &CallContext,
        filter: &LaptopFilter,
        found: &mut dyn FnMut(Laptop) -> Result<()>,
    ) -> Result<()> {
        let data = self.data.read();
        for laptop in data.values() {
            ctx.check()?;
            if is_qualified(filter, laptop) {
                found(laptop.clone())?;
            }
        }
        Ok(())
    }
}

/// Returns true when the laptop satisfies every predicate in the filter.
fn is_qualified(filter: &LaptopFilter, laptop: &Laptop) -> bool {
    if laptop.price_usd > filter.max_price_usd {
        return false;
    }
    if laptop.cpu.as_ref().map_or(0, |cpu| cpu.num_cores) < filter.min_cpu_cores {
        return false;
    }
    if laptop.cpu.as_ref().map_or(0.0, |cpu| cpu.min_ghz) < filter.min_cpu_ghz {
        return false;
    }
    if memory_bits(laptop.ram.as_ref()) < memory_bits(filter.min_ram.as_ref()) {
        return false;
    }
    true
}

/// Normalizes a memory amount to bits so values in different units compare.
fn memory_bits(memory: Option<&Memory>) -> u64 {
    let Some(memory) = memory else { return 0 };
    let value = memory.value;
    match memory.unit() {
        Unit::Bit => value,
        Unit::Byte => value << 3,      // 8 = 2^3
        Unit::Kilobyte => value << 13, // 8 * 1024 = 2^13
        Unit::Megabyte => value << 23, // 8 * 1024^2 = 2^23
        Unit::Gigabyte => value << 33, // 8 * 1024^3 = 2^33
        Unit::Terabyte => value << 43, // 8 * 1024^4 = 2^43
        Unit::Unknown => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_tonic_core::proto::Cpu;
    use tonic::metadata::MetadataMap;

    fn laptop(id: &str, price_usd: f64, num_cores: u32, min_ghz: f64, ram_gb: u64) -> Laptop {
        Laptop {
            id: id.to_owned(),
            brand: "Lenovo".to_owned(),
            name: "Thinkpad X1".to_owned(),
            cpu: Some(Cpu {
                brand: "Intel".to_owned(),
                name: "Core i7".to_owned(),
                num_cores,
                num_threads: num_cores * 2,
                min_ghz,
                max_ghz: min_ghz + 2.0,
            }),
            ram: Some(Memory {
                value: ram_gb,
                unit: Unit::Gigabyte as i32,
            }),
            price_usd,
            ..Default::default()
        }
    }

    fn ctx() -> CallContext {
        CallContext::from_metadata(&MetadataMap::new())
    }

    #[test]
    fn save_then_find_returns_equal_copy() {
        let store = InMemoryLaptopStore::new();
        let laptop = laptop("7cd60c6e-21ef-44f1-aa38-f53e2dba8f71", 1500.0, 4, 2.5, 8);

        store.save(&laptop).unwrap();
        let other = store.find(&laptop.id).unwrap();
        assert_eq!(laptop, other);
    }

    #[test]
    fn duplicate_save_fails_and_keeps_the_original() {
        let store = InMemoryLaptopStore::new();
        let original = laptop("7cd60c6e-21ef-44f1-aa38-f53e2dba8f71", 1500.0, 4, 2.5, 8);
        store.save(&original).unwrap();

        let mut replacement = original.clone();
        replacement.price_usd = 1.0;
        let err = store.save(&replacement).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(store.find(&original.id).unwrap(), original);
    }

    #[test]
    fn find_hands_out_a_copy() {
        let store = InMemoryLaptopStore::new();
        let original = laptop("7cd60c6e-21ef-44f1-aa38-f53e2dba8f71", 1500.0, 4, 2.5, 8);
        store.save(&original).unwrap();

        let mut copy = store.find(&original.id).unwrap();
        copy.price_usd = 1.0;
        copy.cpu.as_mut().unwrap().num_cores = 64;

        assert_eq!(store.find(&original.id).unwrap(), original);
    }

    #[test]
    fn missing_id_is_not_an_error() {
        let store = InMemoryLaptopStore::new();
        assert!(store.find("no-such-id").is_none());
    }

    #[test]
    fn search_emits_exactly_the_matching_subset() {
        let filter = LaptopFilter {
            max_price_usd: 2000.0,
            min_cpu_cores: 4,
            min_cpu_ghz: 2.2,
            min_ram: Some(Memory {
                value: 8,
                unit: Unit::Gigabyte as i32,
            }),
        };

        let store = InMemoryLaptopStore::new();
        // One disqualifier per entry, then two full matches.
        let candidates = [
            laptop("413ef533-66b4-4e59-b1fa-5fd260e0b15d", 2500.0, 4, 2.5, 8),
            laptop("70e868a8-8e9c-4c26-b985-8bb356a82dca", 1999.0, 2, 2.5, 8),
            laptop("fa60d459-2d2c-4f3e-8cc9-0ba0c2868a6f", 1999.0, 4, 2.0, 8),
            laptop("0ee0ba90-87d5-4b2a-8418-16a4b1fa49b5", 1999.0, 4, 2.5, 4),
            laptop("c44cf776-e0d3-4ee3-a2a7-f64e24e4941a", 1999.0, 4, 2.5, 16),
            laptop("4b6a1fad-a41a-47dc-ba07-dc1a5a58c430", 2000.0, 6, 2.8, 64),
        ];
        for candidate in &candidates {
            store.save(candidate).unwrap();
        }

        let mut found = Vec::new();
        store
            .search(&ctx(), &filter, &mut |laptop| {
                found.push(laptop.id.clone());
                Ok(())
            })
            .unwrap();

        found.sort();
        let mut expected = vec![
            candidates[4].id.clone(),
            candidates[5].id.clone(),
        ];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn search_aborts_on_cancelled_context() {
        let store = InMemoryLaptopStore::new();
        store
            .save(&laptop("7cd60c6e-21ef-44f1-aa38-f53e2dba8f71", 100.0, 8, 3.0, 32))
            .unwrap();

        let ctx = ctx();
        ctx.cancellation().cancel();

        let err = store
            .search(&ctx, &LaptopFilter::default(), &mut |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn search_propagates_emit_errors() {
        let store = InMemoryLaptopStore::new();
        store
            .save(&laptop("7cd60c6e-21ef-44f1-aa38-f53e2dba8f71", 100.0, 8, 3.0, 32))
            .unwrap();

        let filter = LaptopFilter {
            max_price_usd: 10_000.0,
            ..Default::default()
        };
        let err = store
            .search(&ctx(), &filter, &mut |_| {
                Err(Error::ChannelError {
                    context: "receiver gone".to_owned(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, Error::ChannelError { .. }));
    }

    #[test]
    fn memory_normalizes_across_units() {
        let gigabytes = Memory {
            value: 8,
            unit: Unit::Gigabyte as i32,
        };
        let megabytes = Memory {
            value: 8 * 1024,
            unit: Unit::Megabyte as i32,
        };
        assert_eq!(memory_bits(Some(&gigabytes)), memory_bits(Some(&megabytes)));
        assert_eq!(
            memory_bits(Some(&Memory {
                value: 1,
                unit: Unit::Byte as i32,
            })),
            8
        );
        assert_eq!(memory_bits(None), 0);
    }
}
