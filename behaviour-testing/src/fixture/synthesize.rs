// File: behaviour-testing/src/fixture/synthesize.rs
//
// Built-in synthesis strategies.
//
// Numbers are small and positive (1..=255, clamped to the type), strings are
// random alphanumeric, collections hold `repeat_count` elements. Containers
// that can be empty (Option, collections) omit their content when the element
// type recurses back into a type already being synthesized.

use super::Fixture;
use crate::error::FixtureError;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// A type the fixture knows how to build
///
/// The default method fails with [`FixtureError::NoStrategy`], so a subject
/// that is always hand-built only needs an empty impl:
///
/// ```rust
/// use behaviour_testing::fixture::Synthesize;
///
/// struct Connection;
///
/// impl Synthesize for Connection {}
/// ```
pub trait Synthesize: Sized {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        let _ = fixture;
        Err(FixtureError::NoStrategy {
            type_name: type_name::<Self>(),
        })
    }
}

macro_rules! synthesize_integer {
    ($($t:ty => $max:expr),* $(,)?) => {
        $(
            impl Synthesize for $t {
                fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
                    Ok(fixture.rng().gen_range(1..=$max))
                }
            }
        )*
    };
}

synthesize_integer! {
    u8 => u8::MAX,
    u16 => 255,
    u32 => 255,
    u64 => 255,
    u128 => 255,
    usize => 255,
    i8 => i8::MAX,
    i16 => 255,
    i32 => 255,
    i64 => 255,
    i128 => 255,
    isize => 255,
}

impl Synthesize for f32 {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        Ok(fixture.rng().gen_range(1.0..256.0))
    }
}

impl Synthesize for f64 {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        Ok(fixture.rng().gen_range(1.0..256.0))
    }
}

impl Synthesize for bool {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        Ok(fixture.rng().gen())
    }
}

impl Synthesize for char {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        fixture
            .rng()
            .alphanumeric(1)
            .chars()
            .next()
            .ok_or(FixtureError::Conversion {
                type_name: "char",
                reason: "empty sample".to_string(),
            })
    }
}

impl Synthesize for String {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        Ok(fixture.string())
    }
}

impl Synthesize for () {
    fn synthesize(_: &mut Fixture) -> Result<Self, FixtureError> {
        Ok(())
    }
}

impl Synthesize for Duration {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        Ok(Duration::from_millis(fixture.rng().gen_range(1..=60_000)))
    }
}

// Anchored to a fixed epoch so the value only depends on the seed
impl Synthesize for DateTime<Utc> {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        let base = Utc
            .with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
            .single()
            .ok_or(FixtureError::Conversion {
                type_name: type_name::<Self>(),
                reason: "invalid epoch".to_string(),
            })?;
        let offset = fixture.rng().gen_range(0..=5 * 365 * 24 * 3600_i64);
        Ok(base + ChronoDuration::seconds(offset))
    }
}

fn omit_on_recursion<T>(result: Result<T, FixtureError>) -> Result<Option<T>, FixtureError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(FixtureError::RecursionDetected { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn collect<T, C>(fixture: &mut Fixture) -> Result<C, FixtureError>
where
    T: Synthesize + 'static,
    C: FromIterator<T>,
{
    let mut items = Vec::with_capacity(fixture.repeat_count());
    for _ in 0..fixture.repeat_count() {
        match omit_on_recursion(fixture.create::<T>())? {
            Some(item) => items.push(item),
            None => return Ok(C::from_iter(std::iter::empty())),
        }
    }
    Ok(items.into_iter().collect())
}

impl<T: Synthesize + 'static> Synthesize for Option<T> {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        omit_on_recursion(fixture.create::<T>())
    }
}

impl<T: Synthesize + 'static> Synthesize for Box<T> {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        fixture.create::<T>().map(Box::new)
    }
}

impl<T: Synthesize + 'static> Synthesize for Arc<T> {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        fixture.create::<T>().map(Arc::new)
    }
}

impl<T: Synthesize + 'static> Synthesize for Rc<T> {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        fixture.create::<T>().map(Rc::new)
    }
}

impl<T: Synthesize + 'static> Synthesize for Vec<T> {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        collect::<T, _>(fixture)
    }
}

impl<T: Synthesize + 'static> Synthesize for VecDeque<T> {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        collect::<T, _>(fixture)
    }
}

impl<T: Synthesize + Eq + Hash + 'static> Synthesize for HashSet<T> {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        collect::<T, _>(fixture)
    }
}

impl<T: Synthesize + Ord + 'static> Synthesize for BTreeSet<T> {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        collect::<T, _>(fixture)
    }
}

impl<K, V> Synthesize for HashMap<K, V>
where
    K: Synthesize + Eq + Hash + 'static,
    V: Synthesize + 'static,
{
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        collect::<(K, V), _>(fixture)
    }
}

impl<K, V> Synthesize for BTreeMap<K, V>
where
    K: Synthesize + Ord + 'static,
    V: Synthesize + 'static,
{
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        collect::<(K, V), _>(fixture)
    }
}

// Arrays ignore repeat_count, their length is part of the type
impl<T: Synthesize + 'static, const N: usize> Synthesize for [T; N] {
    fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
        let items = fixture.create_many_n::<T>(N)?;
        items.try_into().map_err(|_| FixtureError::Conversion {
            type_name: type_name::<Self>(),
            reason: format!("expected {} elements", N),
        })
    }
}

macro_rules! synthesize_tuple {
    ($($name:ident),+) => {
        impl<$($name: Synthesize + 'static),+> Synthesize for ($($name,)+) {
            fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
                Ok(($(fixture.create::<$name>()?,)+))
            }
        }
    };
}

synthesize_tuple!(A);
synthesize_tuple!(A, B);
synthesize_tuple!(A, B, C);
synthesize_tuple!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_are_small_and_positive() {
        let mut fixture = Fixture::with_seed(11);
        for _ in 0..50 {
            let a: i8 = fixture.create().unwrap();
            let b: u64 = fixture.create().unwrap();
            let c: f64 = fixture.create().unwrap();
            assert!(a >= 1);
            assert!((1..=255).contains(&b));
            assert!((1.0..256.0).contains(&c));
        }
    }

    #[test]
    fn test_string_length_follows_fixture() {
        let mut fixture = Fixture::with_seed(11);
        fixture.set_string_length(32);
        let s: String = fixture.create().unwrap();
        assert_eq!(s.len(), 32);
    }

    #[test]
    fn test_collections_use_repeat_count() {
        let mut fixture = Fixture::with_seed(3).with_repeat_count(4);
        let v: Vec<String> = fixture.create().unwrap();
        let d: VecDeque<bool> = fixture.create().unwrap();
        let m: BTreeMap<String, u8> = fixture.create().unwrap();
        assert_eq!(v.len(), 4);
        assert_eq!(d.len(), 4);
        // String keys of length 12 practically never collide
        assert_eq!(m.len(), 4);
    }

    #[test]
    fn test_option_is_populated() {
        let mut fixture = Fixture::with_seed(3);
        let o: Option<String> = fixture.create().unwrap();
        assert!(o.is_some());
    }

    #[test]
    fn test_array_and_tuple() {
        let mut fixture = Fixture::with_seed(3);
        let arr: [u16; 5] = fixture.create().unwrap();
        assert!(arr.iter().all(|v| *v >= 1));
        let (a, b, c): (String, bool, Arc<u32>) = fixture.create().unwrap();
        assert_eq!(a.len(), fixture.string_length());
        let _ = b;
        assert!(*c >= 1);
    }

    #[test]
    fn test_datetime_is_seed_deterministic() {
        let mut a = Fixture::with_seed(77);
        let mut b = Fixture::with_seed(77);
        let left: DateTime<Utc> = a.create().unwrap();
        let right: DateTime<Utc> = b.create().unwrap();
        assert_eq!(left, right);
        assert!(left.timestamp() >= 1_577_836_800);
    }

    #[test]
    fn test_customized_element_flows_into_collection() {
        let mut fixture = Fixture::with_seed(3);
        fixture.inject(9u32);
        let v: Vec<u32> = fixture.create().unwrap();
        assert_eq!(v, vec![9, 9, 9]);
    }
}
