//! Alert delivery tests.
//!
//! Drives the full path from a signalled attribute through the monitor
//! thread, the ledger's route and the alert evaluator to the application
//! callback, using simulated attributes and signal lines.

use node_common::alert::{AlertCallbackData, AlertState};
use node_common::device::{DeviceDescriptor, DeviceObject, DeviceType};
use node_common::error::LedgerError;
use node_common::value::Value;
use node_hal::{
    AppCallback, DriverRegistry, Ledger, LedgerContext, SimulatedAttributes, SimulatedLines,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(200);

const BASE: &str = "/sim/hwmon0";
const T1_MAX_ALERT: usize = 5;
const T1_CRIT_ALERT: usize = 6;

type Delivery = (DeviceObject, Vec<AlertCallbackData>);

struct Rig {
    attrs: Arc<SimulatedAttributes>,
    lines: Arc<SimulatedLines>,
    ledger: Ledger,
    obj: DeviceObject,
}

impl Rig {
    fn new() -> Self {
        let attrs = Arc::new(SimulatedAttributes::new());
        let lines = Arc::new(SimulatedLines::new());
        let ledger = Ledger::new(
            DriverRegistry::with_builtin_drivers(),
            LedgerContext {
                attrs: attrs.clone(),
                lines: lines.clone(),
                properties: None,
                poll_interval: Duration::from_millis(5),
            },
        );
        let desc = DeviceDescriptor {
            name: "TMP464".to_string(),
            description: "PA temperature".to_string(),
            device_type: DeviceType::Temperature,
            attr_path: Some(BASE.to_string()),
            hw: None,
        };
        let reports = ledger.register("ComV1", &[desc]);
        assert_eq!(reports[0].result, Ok(()));
        let obj = reports[0].obj.clone();

        let props = ledger.read_properties(&obj).unwrap();
        attrs.seed_device(Path::new(BASE), &props);
        attrs.set(format!("{BASE}/temp1_max"), "80000");
        attrs.set(format!("{BASE}/temp1_crit"), "100000");
        attrs.set(format!("{BASE}/temp1_input"), "45000");

        Self {
            attrs,
            lines,
            ledger,
            obj,
        }
    }

    fn subscribe(&self) -> Receiver<Delivery> {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let callback: AppCallback =
            Arc::new(move |obj: &DeviceObject, events: &[AlertCallbackData]| {
                let _ = tx.lock().send((obj.clone(), events.to_vec()));
            });
        self.ledger.register_app_callback(&self.obj, callback).unwrap();
        rx
    }

    fn set(&self, attr: &str, text: &str) {
        self.attrs.set(format!("{BASE}/{attr}"), text);
    }

    fn fire(&self, attr: &str) {
        assert_eq!(self.lines.trigger(&Path::new(BASE).join(attr)), 1);
    }
}

#[test]
fn test_confirmed_alert_reaches_callback() {
    let rig = Rig::new();
    let rx = rig.subscribe();
    rig.ledger.enable_irq(&rig.obj, T1_MAX_ALERT).unwrap();

    rig.set("temp1_input", "90000");
    rig.set("temp1_max_alarm", "1");
    rig.fire("temp1_max_alarm");

    let (obj, events) = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(obj, rig.obj);
    assert_eq!(
        events,
        vec![AlertCallbackData {
            alert_state: AlertState::HighAlarmActive,
            property_index: T1_MAX_ALERT,
            raw_value: Value::I32(90000),
        }]
    );
    rig.ledger.shutdown();
}

#[test]
fn test_cleared_alert_reports_no_alarm() {
    let rig = Rig::new();
    let rx = rig.subscribe();
    rig.ledger.enable_irq(&rig.obj, T1_CRIT_ALERT).unwrap();

    rig.set("temp1_input", "70000");
    rig.set("temp1_crit_alarm", "0");
    rig.fire("temp1_crit_alarm");

    let (_, events) = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].alert_state, AlertState::NoAlarmActive);
    assert_eq!(events[0].property_index, T1_CRIT_ALERT);
    rig.ledger.shutdown();
}

#[test]
fn test_false_trigger_is_discarded() {
    let rig = Rig::new();
    let rx = rig.subscribe();
    rig.ledger.enable_irq(&rig.obj, T1_MAX_ALERT).unwrap();

    // Hardware bit set, but the reading is below the limit.
    rig.set("temp1_input", "60000");
    rig.set("temp1_max_alarm", "1");
    rig.fire("temp1_max_alarm");

    assert_eq!(rx.recv_timeout(QUIET), Err(RecvTimeoutError::Timeout));
    rig.ledger.shutdown();
}

#[test]
fn test_no_delivery_without_app_callback() {
    let rig = Rig::new();
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let callback: AppCallback = Arc::new(move |obj: &DeviceObject, _: &[AlertCallbackData]| {
        let _ = tx.lock().send(obj.clone());
    });
    rig.ledger.register_app_callback(&rig.obj, callback.clone()).unwrap();
    rig.ledger.deregister_app_callback(&rig.obj).unwrap();
    rig.ledger.enable_irq(&rig.obj, T1_MAX_ALERT).unwrap();

    rig.set("temp1_input", "90000");
    rig.set("temp1_max_alarm", "1");
    rig.fire("temp1_max_alarm");

    // `callback` keeps the sender alive, so silence means no delivery.
    assert_eq!(rx.recv_timeout(QUIET), Err(RecvTimeoutError::Timeout));
    drop(callback);
    rig.ledger.shutdown();
}

#[test]
fn test_irq_enable_is_idempotent_and_disable_joins() {
    let rig = Rig::new();
    let _rx = rig.subscribe();

    for _ in 0..3 {
        rig.ledger.enable_irq(&rig.obj, T1_MAX_ALERT).unwrap();
    }
    assert_eq!(rig.ledger.irqs().len(), 1);
    assert_eq!(rig.lines.opened(), 1);

    rig.ledger.disable_irq(&rig.obj, T1_MAX_ALERT).unwrap();
    assert!(rig.ledger.irqs().is_empty());
    assert_eq!(rig.lines.trigger(&Path::new(BASE).join("temp1_max_alarm")), 0);

    assert!(matches!(
        rig.ledger.disable_irq(&rig.obj, T1_MAX_ALERT),
        Err(LedgerError::IrqNotRegistered(_))
    ));

    // Re-enabling starts a fresh monitor.
    rig.ledger.enable_irq(&rig.obj, T1_MAX_ALERT).unwrap();
    assert_eq!(rig.lines.opened(), 2);
    rig.ledger.shutdown();
}

#[test]
fn test_unavailable_alert_cannot_be_armed() {
    let rig = Rig::new();
    // T1 MAX HYSTERESIS is absent on this revision.
    assert_eq!(
        rig.ledger.enable_irq(&rig.obj, 8),
        Err(LedgerError::PropertyMissing { index: 8 })
    );
    assert!(rig.ledger.irqs().is_empty());
}

#[test]
fn test_shutdown_joins_every_monitor() {
    let rig = Rig::new();
    let _rx = rig.subscribe();
    for idx in [4, 5, 6, 14, 15, 16] {
        rig.ledger.enable_irq(&rig.obj, idx).unwrap();
    }
    assert_eq!(rig.ledger.irqs().len(), 6);

    rig.ledger.shutdown();
    assert!(rig.ledger.irqs().is_empty());
    assert_eq!(rig.ledger.registered_count(DeviceType::Temperature), 0);
    assert_eq!(rig.lines.trigger(&Path::new(BASE).join("temp1_max_alarm")), 0);

    rig.ledger.shutdown();
}

#[test]
fn test_monitor_can_disable_other_source_from_callback() {
    let rig = Rig::new();
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let ledger = rig.ledger.clone();
    let obj = rig.obj.clone();
    let callback: AppCallback = Arc::new(move |_: &DeviceObject, events: &[AlertCallbackData]| {
        let result = ledger.disable_irq(&obj, T1_CRIT_ALERT);
        let _ = tx.lock().send((events[0].property_index, result));
    });
    rig.ledger.register_app_callback(&rig.obj, callback).unwrap();
    rig.ledger.enable_irq(&rig.obj, T1_MAX_ALERT).unwrap();
    rig.ledger.enable_irq(&rig.obj, T1_CRIT_ALERT).unwrap();

    rig.set("temp1_input", "90000");
    rig.set("temp1_max_alarm", "1");
    rig.fire("temp1_max_alarm");

    let (index, result) = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(index, T1_MAX_ALERT);
    assert_eq!(result, Ok(()));
    assert_eq!(rig.ledger.irqs().len(), 1);
    rig.ledger.shutdown();
}
