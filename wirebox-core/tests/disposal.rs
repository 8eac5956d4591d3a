//! Disposal ordering and post-disposal behavior — testable properties 8, 9
//! and scenario S6.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use wirebox_core::container::Container;
use wirebox_core::dispose::Dispose;
use wirebox_core::error::{DisposedTarget, WireError};
use wirebox_core::lifetime::Lifetime;

struct Counted {
    disposals: Arc<AtomicU32>,
}
impl Dispose for Counted {
    fn dispose(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.disposals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// S6: a scoped disposable's counter goes from 0 to 1 on scope disposal; a
/// second dispose call is a documented idempotent failure (`AlreadyDisposed`),
/// and the counter does not move again.
#[test]
fn scoped_disposable_disposed_exactly_once() {
    let disposals = Arc::new(AtomicU32::new(0));
    let provider = Container::builder()
        .register_factory(Lifetime::Scoped, {
            let disposals = disposals.clone();
            move |resolver| {
                let instance = Arc::new(Counted {
                    disposals: disposals.clone(),
                });
                resolver.register_disposable(instance.clone());
                Ok(instance)
            }
        })
        .build()
        .unwrap();

    let scope = provider.create_scope().unwrap();
    let _: Arc<Counted> = scope.resolve().unwrap();
    assert_eq!(disposals.load(Ordering::SeqCst), 0);

    scope.dispose().unwrap();
    assert_eq!(disposals.load(Ordering::SeqCst), 1);

    let second = scope.dispose().unwrap_err();
    assert!(matches!(second, WireError::AlreadyDisposed(DisposedTarget::Scope)));
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
}

/// Property 9: resolving on an already-disposed scope fails fast.
#[test]
fn resolve_after_scope_disposal_fails_fast() {
    let provider = Container::builder().register_instance(1i32).build().unwrap();
    let scope = provider.create_scope().unwrap();
    scope.dispose().unwrap();

    let err = scope.resolve::<i32>().unwrap_err();
    assert!(matches!(err, WireError::AlreadyDisposed(DisposedTarget::Scope)));
}

/// Property 8: multiple disposables created inside one scope are torn down
/// in strict reverse creation order.
#[test]
fn multiple_disposables_torn_down_in_reverse_order() {
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    struct Recorder(Arc<parking_lot::Mutex<Vec<u32>>>, u32);
    impl Dispose for Recorder {
        fn dispose(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.0.lock().push(self.1);
            Ok(())
        }
    }

    let provider = Container::builder()
        .register_factory(Lifetime::Transient, {
            let order = order.clone();
            move |resolver| {
                resolver.register_disposable(Arc::new(Recorder(order.clone(), 1)));
                resolver.register_disposable(Arc::new(Recorder(order.clone(), 2)));
                resolver.register_disposable(Arc::new(Recorder(order.clone(), 3)));
                Ok(())
            }
        })
        .build()
        .unwrap();

    let scope = provider.create_scope().unwrap();
    let _: () = scope.resolve().unwrap();
    scope.dispose().unwrap();

    assert_eq!(*order.lock(), vec![3, 2, 1]);
}

/// A failed disposal is collected into an aggregate, but every other
/// disposer in the batch still runs.
#[test]
fn failing_disposer_does_not_block_the_rest() {
    struct Failing;
    impl Dispose for Failing {
        fn dispose(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Err("boom".into())
        }
    }

    let disposals = Arc::new(AtomicU32::new(0));
    let provider = Container::builder()
        .register_factory(Lifetime::Transient, {
            let disposals = disposals.clone();
            move |resolver| {
                resolver.register_disposable(Arc::new(Failing));
                resolver.register_disposable(Arc::new(Counted {
                    disposals: disposals.clone(),
                }));
                Ok(())
            }
        })
        .build()
        .unwrap();

    let scope = provider.create_scope().unwrap();
    let _: () = scope.resolve().unwrap();

    let err = scope.dispose().unwrap_err();
    assert!(matches!(err, WireError::DisposalAggregate { .. }));
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
}
