/// Concurrent access integration tests.
///
/// Advancement is driven from whatever threads call `start`, `set_dependency`
/// or `try_advance`; these tests race those entry points and verify
/// exactly-once initialization and causal ordering along the dependency DAG.
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_utils::thread;

use ferrous_lifecycle::{
    service_ref, AlwaysSatisfied, InitError, Initializable, Injectable, Injection,
    LifecycleResult, QualifiedServiceId, Service, ServiceHolder,
};

struct Probe {
    name: &'static str,
    order: Arc<Mutex<Vec<&'static str>>>,
    init_count: Arc<AtomicU32>,
}

impl Service for Probe {
    fn as_injectable(&self) -> Option<&dyn Injectable> {
        Some(self)
    }
    fn as_injectable_mut(&mut self) -> Option<&mut dyn Injectable> {
        Some(self)
    }
    fn as_initializable(&mut self) -> Option<&mut dyn Initializable> {
        Some(self)
    }
}

impl Injectable for Probe {
    fn is_optional(&self, _id: &str) -> bool {
        false
    }
    fn inject_object(&mut self, _injection: Injection) -> LifecycleResult<()> {
        Ok(())
    }
}

impl Initializable for Probe {
    fn init(&mut self) -> Result<(), InitError> {
        self.order.lock().unwrap().push(self.name);
        self.init_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Graph {
    order: Arc<Mutex<Vec<&'static str>>>,
    counts: Vec<Arc<AtomicU32>>,
}

impl Graph {
    fn new() -> Self {
        Self {
            order: Arc::new(Mutex::new(Vec::new())),
            counts: Vec::new(),
        }
    }

    fn node(&mut self, name: &'static str, dependencies: &[&str]) -> ServiceHolder {
        let count = Arc::new(AtomicU32::new(0));
        self.counts.push(count.clone());
        ServiceHolder::with_dependencies(
            QualifiedServiceId::local(name),
            service_ref(Probe {
                name,
                order: self.order.clone(),
                init_count: count,
            }),
            dependencies.iter().map(|id| QualifiedServiceId::local(*id)).collect(),
            Arc::new(AlwaysSatisfied),
        )
    }
}

fn position(order: &[&str], name: &str) -> usize {
    order.iter().position(|entry| *entry == name).unwrap()
}

#[test]
fn concurrent_starts_initialize_each_node_exactly_once() {
    let mut graph = Graph::new();
    let a = graph.node("a", &["b"]);
    let b = graph.node("b", &["c"]);
    let c = graph.node("c", &[]);
    b.set_dependency(&c).unwrap();
    a.set_dependency(&b).unwrap();

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|_| {
                a.start().unwrap();
                b.start().unwrap();
                c.start().unwrap();
                a.try_advance().unwrap();
            });
        }
    })
    .unwrap();

    assert!(a.is_initialized());
    assert!(b.is_initialized());
    assert!(c.is_initialized());
    for count in &graph.counts {
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
    let order = graph.order.lock().unwrap();
    assert!(position(&order, "c") < position(&order, "b"));
    assert!(position(&order, "b") < position(&order, "a"));
}

#[test]
fn concurrent_binds_complete_a_started_consumer() {
    let mut graph = Graph::new();
    let app = graph.node("app", &["d0", "d1", "d2", "d3"]);
    let providers: Vec<ServiceHolder> = (0..4)
        .map(|index| {
            let name: &'static str = ["d0", "d1", "d2", "d3"][index];
            graph.node(name, &[])
        })
        .collect();

    assert!(!app.start().unwrap());

    let app_ref = &app;
    thread::scope(|scope| {
        for provider in &providers {
            scope.spawn(move |_| {
                app_ref.set_dependency(provider).unwrap();
            });
        }
    })
    .unwrap();

    assert!(app.is_initialized());
    for provider in &providers {
        assert!(provider.is_initialized());
    }
    for count in &graph.counts {
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
    let order = graph.order.lock().unwrap();
    assert_eq!(position(&order, "app"), order.len() - 1);
}

#[test]
fn racing_advance_calls_on_a_diamond_stay_causal() {
    let mut graph = Graph::new();
    let app = graph.node("app", &["left", "right"]);
    let left = graph.node("left", &["base"]);
    let right = graph.node("right", &["base"]);
    let base = graph.node("base", &[]);

    left.set_dependency(&base).unwrap();
    right.set_dependency(&base).unwrap();
    app.set_dependency(&left).unwrap();
    app.set_dependency(&right).unwrap();

    thread::scope(|scope| {
        scope.spawn(|_| app.start().unwrap());
        scope.spawn(|_| left.start().unwrap());
        scope.spawn(|_| right.start().unwrap());
        scope.spawn(|_| base.start().unwrap());
        for _ in 0..4 {
            scope.spawn(|_| {
                app.try_advance().unwrap();
            });
        }
    })
    .unwrap();

    // Whichever thread won, the graph settles fully initialized.
    app.try_advance().unwrap();
    assert!(app.is_initialized());

    for count in &graph.counts {
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
    let order = graph.order.lock().unwrap();
    assert!(position(&order, "base") < position(&order, "left"));
    assert!(position(&order, "base") < position(&order, "right"));
    assert!(position(&order, "left") < position(&order, "app"));
    assert!(position(&order, "right") < position(&order, "app"));
}
