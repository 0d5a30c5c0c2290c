//! Integration tests for capture/target/bubble propagation along a parent chain

use cadence_core::{listener, Dispatchable, Event, EventDispatcher, EventPhase, Listener};
use std::cell::RefCell;
use std::rc::Rc;

/// A minimal scene-graph node: a dispatcher plus a parent back-reference
struct Node {
    name: &'static str,
    events: EventDispatcher,
    parent: Option<Rc<Node>>,
}

impl Node {
    fn root(name: &'static str) -> Rc<Self> {
        Rc::new(Self {
            name,
            events: EventDispatcher::new(),
            parent: None,
        })
    }

    fn child_of(name: &'static str, parent: &Rc<Node>) -> Rc<Self> {
        Rc::new(Self {
            name,
            events: EventDispatcher::new(),
            parent: Some(parent.clone()),
        })
    }
}

impl Dispatchable for Node {
    fn dispatcher(&self) -> &EventDispatcher {
        &self.events
    }

    fn parent(&self) -> Option<Rc<dyn Dispatchable>> {
        self.parent.clone().map(|p| p as Rc<dyn Dispatchable>)
    }
}

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, label: String) -> Listener {
    let log = log.clone();
    listener(move |event: &mut Event| {
        let phase = match event.phase {
            EventPhase::Capture => "capture",
            EventPhase::AtTarget => "target",
            EventPhase::Bubble => "bubble",
            EventPhase::None => "none",
        };
        log.borrow_mut().push(format!("{label}:{phase}"));
    })
}

fn tree() -> (Rc<Node>, Rc<Node>, Rc<Node>) {
    let stage = Node::root("stage");
    let room = Node::child_of("room", &stage);
    let sofa = Node::child_of("sofa", &room);
    (stage, room, sofa)
}

fn listen_everywhere(log: &Log, nodes: &[&Rc<Node>]) {
    for node in nodes {
        node.add_listener("press", recorder(log, format!("{}-cap", node.name)), true);
        node.add_listener("press", recorder(log, node.name.to_string()), false);
    }
}

#[test]
fn bubbling_event_walks_capture_target_bubble() {
    let (stage, room, sofa) = tree();
    let log: Log = Rc::default();
    listen_everywhere(&log, &[&stage, &room, &sofa]);

    sofa.dispatch_with("press", true, false);

    assert_eq!(
        *log.borrow(),
        vec![
            "stage-cap:capture",
            "room-cap:capture",
            "sofa-cap:target",
            "sofa:target",
            "room:bubble",
            "stage:bubble",
        ]
    );
}

#[test]
fn non_bubbling_event_stays_at_target() {
    let (stage, room, sofa) = tree();
    let log: Log = Rc::default();
    listen_everywhere(&log, &[&stage, &room, &sofa]);

    sofa.dispatch("press");

    assert_eq!(*log.borrow(), vec!["sofa-cap:target", "sofa:target"]);
}

#[test]
fn stop_propagation_during_capture_halts_the_walk() {
    let (stage, room, sofa) = tree();
    let log: Log = Rc::default();
    room.add_listener("press", listener(|e| e.stop_propagation()), true);
    listen_everywhere(&log, &[&stage, &sofa]);

    sofa.dispatch_with("press", true, false);

    assert_eq!(*log.borrow(), vec!["stage-cap:capture"]);
}

#[test]
fn current_target_tracks_the_running_node() {
    let (stage, _room, sofa) = tree();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    stage.add_listener(
        "press",
        listener(move |e| s.borrow_mut().push((e.target, e.current_target))),
        false,
    );

    sofa.dispatch_with("press", true, false);

    let sofa_id = Some(sofa.dispatcher().id());
    let stage_id = Some(stage.dispatcher().id());
    assert_eq!(*seen.borrow(), vec![(sofa_id, stage_id)]);
}

#[test]
fn will_trigger_consults_ancestors() {
    let (stage, room, sofa) = tree();
    assert!(!sofa.will_trigger("press"));

    stage.add_listener("press", listener(|_| {}), false);
    assert!(sofa.will_trigger("press"));
    assert!(room.will_trigger("press"));
    assert!(!sofa.has_listener("press"));
}

#[test]
fn prevented_default_bubbles_back_to_dispatcher() {
    let (stage, _room, sofa) = tree();
    stage.add_listener("drop", listener(|e| e.prevent_default()), false);

    assert!(!sofa.dispatch_with("drop", true, true));
    assert!(sofa.dispatch_with("drop", true, false));
}

#[test]
fn redispatching_a_used_event_starts_fresh() {
    let (_stage, room, sofa) = tree();
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    room.add_listener("press", listener(move |_| *c.borrow_mut() += 1), false);

    let mut used = Event::new("press").with_bubbles(true);
    used.target = Some(sofa.dispatcher().id());
    used.stop_propagation();

    sofa.dispatch_event(used);
    assert_eq!(*count.borrow(), 1);
}
