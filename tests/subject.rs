use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use pace_guard_core::reactive::{ConcreteObserver, Observer, Subject};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn labelled(log: &Log, label: &'static str) -> Arc<dyn Observer<u32>> {
    let log = Arc::clone(log);
    Arc::new(move |_: &u32| log.lock().unwrap().push(label))
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_notify_in_registration_order() {
    let subject = Subject::<u32>::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    subject.add_observer(labelled(&log, "a")).unwrap();
    subject.add_observer(labelled(&log, "b")).unwrap();
    subject.add_observer(labelled(&log, "c")).unwrap();

    assert_eq!(subject.notify(&1), Ok(3));
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_observer_receives_data() {
    let subject = Subject::<String>::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    subject
        .add_observer(Arc::new(move |msg: &String| sink.lock().unwrap().push(msg.clone())))
        .unwrap();

    subject.notify(&"first".to_string()).unwrap();
    subject.notify(&"second".to_string()).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn test_duplicate_registration_notified_twice() {
    let subject = Subject::<u32>::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let observer = labelled(&log, "dup");

    subject.add_observer(observer.clone()).unwrap();
    subject.add_observer(observer.clone()).unwrap();
    assert_eq!(subject.observer_count(), Ok(2));

    subject.notify(&0).unwrap();
    assert_eq!(log.lock().unwrap().len(), 2);

    // Removal takes out one registration at a time
    assert_eq!(subject.remove_observer(&observer), Ok(true));
    assert_eq!(subject.observer_count(), Ok(1));
}

#[test]
fn test_remove_observer_twice_is_noop() {
    let subject = Subject::<u32>::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let keep = labelled(&log, "keep");
    let drop_me = labelled(&log, "drop");

    subject.add_observer(keep).unwrap();
    subject.add_observer(drop_me.clone()).unwrap();

    assert_eq!(subject.remove_observer(&drop_me), Ok(true));
    assert_eq!(subject.remove_observer(&drop_me), Ok(false));

    subject.notify(&0).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["keep"]);
}

#[test]
fn test_remove_unknown_observer() {
    let subject = Subject::<u32>::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let stranger = labelled(&log, "stranger");

    assert_eq!(subject.remove_observer(&stranger), Ok(false));
    assert_eq!(subject.observer_count(), Ok(0));
}

#[test]
fn test_remove_by_concrete_arc() {
    struct Counter(Mutex<u32>);
    impl Observer<u32> for Counter {
        fn update(&self, data: &u32) {
            *self.0.lock().unwrap() += *data;
        }
    }

    let subject = Subject::<u32>::new();
    let counter = Arc::new(Counter(Mutex::new(0)));
    subject.add_observer(counter.clone()).unwrap();

    subject.notify(&5).unwrap();
    assert_eq!(subject.remove_observer(&counter), Ok(true));
    subject.notify(&5).unwrap();

    assert_eq!(*counter.0.lock().unwrap(), 5);
}

#[test]
fn test_observer_removing_itself_during_notify() {
    let subject = Arc::new(Subject::<u32>::new());
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let slot: Arc<Mutex<Option<Arc<dyn Observer<u32>>>>> = Arc::new(Mutex::new(None));

    let owner = Arc::clone(&subject);
    let me = Arc::clone(&slot);
    let sink = Arc::clone(&log);
    let once: Arc<dyn Observer<u32>> = Arc::new(move |_: &u32| {
        sink.lock().unwrap().push("once");
        let this = me.lock().unwrap().take();
        if let Some(this) = this {
            assert_eq!(owner.remove_observer(&this), Ok(true));
        }
    });
    *slot.lock().unwrap() = Some(once.clone());

    subject.add_observer(labelled(&log, "before")).unwrap();
    subject.add_observer(once).unwrap();
    subject.add_observer(labelled(&log, "after")).unwrap();

    // Snapshot: everyone registered at the start is notified
    assert_eq!(subject.notify(&1), Ok(3));
    assert_eq!(*log.lock().unwrap(), vec!["before", "once", "after"]);

    log.lock().unwrap().clear();
    assert_eq!(subject.notify(&2), Ok(2));
    assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
}

#[test]
fn test_observer_added_during_notify_waits_for_next_round() {
    let subject = Arc::new(Subject::<u32>::new());
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let owner = Arc::clone(&subject);
    let late = labelled(&log, "late");
    let added = Arc::new(Mutex::new(false));
    let sink = Arc::clone(&log);
    subject
        .add_observer(Arc::new(move |_: &u32| {
            sink.lock().unwrap().push("adder");
            let mut added = added.lock().unwrap();
            if !*added {
                owner.add_observer(late.clone()).unwrap();
                *added = true;
            }
        }))
        .unwrap();

    subject.notify(&1).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["adder"]);

    subject.notify(&2).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["adder", "adder", "late"]);
}

#[test]
fn test_slow_observer_delays_later_observers() {
    let subject = Subject::<u32>::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&log);
    subject
        .add_observer(Arc::new(move |_: &u32| {
            thread::sleep(Duration::from_millis(20));
            sink.lock().unwrap().push("slow");
        }))
        .unwrap();

    let started = Instant::now();
    let reached_at = Arc::new(Mutex::new(None));
    let stamp = Arc::clone(&reached_at);
    let sink = Arc::clone(&log);
    subject
        .add_observer(Arc::new(move |_: &u32| {
            *stamp.lock().unwrap() = Some(Instant::now());
            sink.lock().unwrap().push("fast");
        }))
        .unwrap();

    subject.notify(&0).unwrap();

    // Fan-out is synchronous: the second observer waited for the first
    assert_eq!(*log.lock().unwrap(), vec!["slow", "fast"]);
    let reached = (*reached_at.lock().unwrap()).expect("second observer ran");
    assert!(reached.duration_since(started) >= Duration::from_millis(20));
}

#[test]
fn test_concrete_observer_logs_updates() {
    init_logger();
    let subject = Subject::<Vec<u8>>::new();
    subject
        .add_observer(Arc::new(ConcreteObserver::<Vec<u8>>::new("bytes")))
        .unwrap();

    assert_eq!(subject.notify(&vec![1, 2, 3]), Ok(1));
}
