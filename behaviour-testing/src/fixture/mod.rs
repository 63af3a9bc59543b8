// File: behaviour-testing/src/fixture/mod.rs
//
// Test-data generator.
//
// A Fixture synthesizes values of arbitrary types from a seeded TestRng.
// Types opt in by implementing Synthesize; any type can also be customized
// per fixture with a factory, an injected value or a frozen value, and
// customizations always win over Synthesize.

/// Seeded RNG backing every fixture
pub mod rng;
/// Synthesize trait and the built-in implementations
pub mod synthesize;

pub use rng::TestRng;
pub use synthesize::Synthesize;

use crate::config::{self, defaults};
use crate::error::FixtureError;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

type Factory =
    Arc<dyn Fn(&mut Fixture) -> anyhow::Result<Box<dyn Any + Send>> + Send + Sync + 'static>;

/// Reusable fixture customization
///
/// Closures taking `&mut Fixture` implement this trait, so a customization can
/// be a named type or an inline closure.
///
/// ```rust
/// use behaviour_testing::fixture::{Customization, Fixture};
///
/// struct SmallCollections;
///
/// impl Customization for SmallCollections {
///     fn customize(&self, fixture: &mut Fixture) {
///         fixture.set_repeat_count(1);
///     }
/// }
///
/// let mut fixture = Fixture::with_seed(1);
/// fixture.customize(SmallCollections);
/// assert_eq!(fixture.repeat_count(), 1);
/// ```
pub trait Customization {
    fn customize(&self, fixture: &mut Fixture);
}

impl<F> Customization for F
where
    F: Fn(&mut Fixture),
{
    fn customize(&self, fixture: &mut Fixture) {
        self(fixture)
    }
}

/// Seeded generator of test data
pub struct Fixture {
    rng: TestRng,
    repeat_count: usize,
    string_length: usize,
    factories: HashMap<TypeId, Factory>,
    // Types currently being synthesized, innermost last
    in_progress: Vec<TypeId>,
}

impl Fixture {
    /// Fixture seeded from the environment (see [`TestRng::new_from_env_or_random`])
    pub fn new() -> Self {
        Self::from_rng(TestRng::new_from_env_or_random())
    }

    /// Fixture with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(TestRng::with_seed(seed))
    }

    fn from_rng(rng: TestRng) -> Self {
        let config = config::global();
        Self {
            rng,
            repeat_count: config.repeat_count,
            string_length: config.string_length,
            factories: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn rng(&self) -> &TestRng {
        &self.rng
    }

    /// Number of elements generated for collections
    pub fn repeat_count(&self) -> usize {
        self.repeat_count
    }

    /// Clamped to `1..=MAX_REPEAT_COUNT`, the range configuration accepts
    pub fn set_repeat_count(&mut self, count: usize) -> &mut Self {
        self.repeat_count = count.clamp(1, defaults::MAX_REPEAT_COUNT);
        self
    }

    pub fn with_repeat_count(mut self, count: usize) -> Self {
        self.set_repeat_count(count);
        self
    }

    /// Length of generated strings
    pub fn string_length(&self) -> usize {
        self.string_length
    }

    pub fn set_string_length(&mut self, len: usize) -> &mut Self {
        self.string_length = len;
        self
    }

    /// Synthesize a value of `T`
    ///
    /// A registered customization for `T` is used first; otherwise
    /// [`Synthesize::synthesize`] builds the value.
    ///
    /// # Errors
    ///
    /// - `RecursionDetected` if `T` is already being synthesized further up the stack
    /// - `Factory` if a registered factory fails
    /// - `NoStrategy` if `T` has no customization and no synthesize strategy
    pub fn create<T>(&mut self) -> Result<T, FixtureError>
    where
        T: Synthesize + 'static,
    {
        let id = TypeId::of::<T>();
        if self.in_progress.contains(&id) {
            return Err(FixtureError::RecursionDetected {
                type_name: type_name::<T>(),
            });
        }

        let mut scope = InProgress::enter(self, id);
        let factory = scope.factories.get(&id).cloned();
        match factory {
            Some(factory) => Self::run_factory::<T>(&mut scope, &factory),
            None => T::synthesize(&mut scope),
        }
    }

    fn run_factory<T: 'static>(&mut self, factory: &Factory) -> Result<T, FixtureError> {
        let value = factory(self).map_err(|e| FixtureError::Factory {
            type_name: type_name::<T>(),
            source: e.into(),
        })?;
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| FixtureError::TypeMismatch {
                type_name: type_name::<T>(),
            })
    }

    /// Synthesize `repeat_count` values of `T`
    pub fn create_many<T>(&mut self) -> Result<Vec<T>, FixtureError>
    where
        T: Synthesize + 'static,
    {
        self.create_many_n(self.repeat_count)
    }

    pub fn create_many_n<T>(&mut self, count: usize) -> Result<Vec<T>, FixtureError>
    where
        T: Synthesize + 'static,
    {
        (0..count).map(|_| self.create::<T>()).collect()
    }

    /// Build every future `T` with `factory`
    ///
    /// ```rust
    /// use behaviour_testing::fixture::Fixture;
    ///
    /// let mut fixture = Fixture::with_seed(3);
    /// fixture.register(|f| Ok(format!("user-{}", f.create::<u8>()?)));
    /// assert!(fixture.create::<String>().unwrap().starts_with("user-"));
    /// ```
    pub fn register<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + 'static,
        F: Fn(&mut Fixture) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |fixture: &mut Fixture| {
            factory(fixture).map(|value| Box::new(value) as Box<dyn Any + Send>)
        });
        self.factories.insert(TypeId::of::<T>(), factory);
        self
    }

    /// Always answer `T` with a clone of `value`
    pub fn inject<T>(&mut self, value: T) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.register(move |_| Ok(value.clone()))
    }

    /// Synthesize one `T` and inject it, so every later request sees the same value
    pub fn freeze<T>(&mut self) -> Result<T, FixtureError>
    where
        T: Synthesize + Clone + Send + Sync + 'static,
    {
        let value = self.create::<T>()?;
        self.inject(value.clone());
        Ok(value)
    }

    pub fn customize<C: Customization>(&mut self, customization: C) -> &mut Self {
        customization.customize(self);
        self
    }

    /// Whether `T` has a registered customization
    pub fn is_customized<T: 'static>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<T>())
    }

    pub(crate) fn string(&mut self) -> String {
        self.rng.alphanumeric(self.string_length)
    }
}

/// Marks a type as being synthesized until dropped, panics included
struct InProgress<'a> {
    fixture: &'a mut Fixture,
}

impl<'a> InProgress<'a> {
    fn enter(fixture: &'a mut Fixture, id: TypeId) -> Self {
        fixture.in_progress.push(id);
        Self { fixture }
    }
}

impl Deref for InProgress<'_> {
    type Target = Fixture;

    fn deref(&self) -> &Fixture {
        self.fixture
    }
}

impl DerefMut for InProgress<'_> {
    fn deref_mut(&mut self) -> &mut Fixture {
        self.fixture
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.fixture.in_progress.pop();
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Fixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fixture")
            .field("rng", &self.rng)
            .field("repeat_count", &self.repeat_count)
            .field("string_length", &self.string_length)
            .field("customized_types", &self.factories.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        owner: String,
        balance: u64,
    }

    impl Synthesize for Account {
        fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
            Ok(Self {
                owner: fixture.create()?,
                balance: fixture.create()?,
            })
        }
    }

    struct Opaque;

    impl Synthesize for Opaque {}

    // Node -> Vec<Node> recurses through the collection
    #[derive(Debug)]
    struct Node {
        children: Vec<Node>,
        parent: Option<Box<Node>>,
    }

    impl Synthesize for Node {
        fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
            Ok(Self {
                children: fixture.create()?,
                parent: fixture.create()?,
            })
        }
    }

    struct Looping;

    impl Synthesize for Looping {
        fn synthesize(fixture: &mut Fixture) -> Result<Self, FixtureError> {
            fixture.create::<Looping>()
        }
    }

    #[test]
    fn test_same_seed_same_values() {
        let mut a = Fixture::with_seed(42);
        let mut b = Fixture::with_seed(42);
        assert_eq!(
            a.create::<Account>().unwrap(),
            b.create::<Account>().unwrap()
        );
    }

    #[test]
    fn test_no_strategy() {
        let mut fixture = Fixture::with_seed(1);
        let err = fixture.create::<Opaque>().err().unwrap();
        assert!(matches!(err, FixtureError::NoStrategy { .. }));
    }

    #[test]
    fn test_register_overrides_no_strategy() {
        let mut fixture = Fixture::with_seed(1);
        fixture.register(|_| Ok(Opaque));
        assert!(fixture.is_customized::<Opaque>());
        assert!(fixture.create::<Opaque>().is_ok());
    }

    #[test]
    fn test_failing_factory() {
        let mut fixture = Fixture::with_seed(1);
        fixture.register::<u32, _>(|_| Err(anyhow::anyhow!("no numbers today")));
        let err = fixture.create::<u32>().unwrap_err();
        match err {
            FixtureError::Factory { type_name, source } => {
                assert_eq!(type_name, "u32");
                assert_eq!(source.to_string(), "no numbers today");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_inject_and_freeze() {
        let mut fixture = Fixture::with_seed(5);
        fixture.inject(7u16);
        assert_eq!(fixture.create::<u16>().unwrap(), 7);

        let frozen = fixture.freeze::<Account>().unwrap();
        assert_eq!(fixture.create::<Account>().unwrap(), frozen);
        assert_eq!(fixture.create::<Account>().unwrap(), frozen);
    }

    #[test]
    fn test_customize_with_closure() {
        let mut fixture = Fixture::with_seed(5);
        fixture.customize(|f: &mut Fixture| {
            f.set_repeat_count(5).set_string_length(4);
        });
        let names = fixture.create_many::<String>().unwrap();
        assert_eq!(names.len(), 5);
        assert!(names.iter().all(|n| n.len() == 4));
    }

    #[test]
    fn test_repeat_count_is_clamped() {
        let mut fixture = Fixture::with_seed(2).with_repeat_count(usize::MAX);
        assert_eq!(fixture.repeat_count(), defaults::MAX_REPEAT_COUNT);
        assert_eq!(fixture.create::<Vec<()>>().unwrap().len(), defaults::MAX_REPEAT_COUNT);

        fixture.set_repeat_count(0);
        assert_eq!(fixture.repeat_count(), 1);
    }

    #[test]
    fn test_omit_on_recursion() {
        let mut fixture = Fixture::with_seed(9);
        let node = fixture.create::<Node>().unwrap();
        assert!(node.children.is_empty());
        assert!(node.parent.is_none());
    }

    #[test]
    fn test_direct_recursion_fails() {
        let mut fixture = Fixture::with_seed(9);
        let err = fixture.create::<Looping>().err().unwrap();
        assert!(matches!(err, FixtureError::RecursionDetected { .. }));
        // The in-progress stack unwinds even on failure
        assert!(fixture.create::<u8>().is_ok());
    }

    #[test]
    fn test_panicking_factory_leaves_type_creatable() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut fixture = Fixture::with_seed(9);
        let counter = calls.clone();
        fixture.register(move |_| {
            if counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                panic!("first build fails");
            }
            Ok(Opaque)
        });

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            fixture.create::<Opaque>().is_ok()
        }));
        assert!(outcome.is_err());

        assert!(fixture.create::<Opaque>().is_ok());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
