//! Device ledger.
//!
//! The `Ledger` is the main entry point for device operations. It owns one
//! device container per category, binds each registered device to its
//! driver table, and routes fired interrupts to application callbacks.
//!
//! Every operation takes the partition lock only long enough to copy the
//! device out; driver slots run unlocked. Monitor threads are never joined
//! while a partition lock is held.

use crate::attr::{AttributeAccessor, SysfsAccessor};
use crate::device::{AppCallback, Device, same_device};
use crate::dispatch;
use crate::driver::DriverEnv;
use crate::driver_registry::DriverRegistry;
use crate::irq::{self, InterruptRegistry, IrqCallback, IrqSource, SignalLines};
use crate::list::List;
use crate::property_loader::PropertyLoader;
use node_common::config::LedgerSettings;
use node_common::device::{DeviceDescriptor, DeviceObject, DeviceType};
use node_common::error::LedgerError;
use node_common::property::PropertyTable;
use node_common::value::Value;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Collaborators the ledger is built from.
#[derive(Clone)]
pub struct LedgerContext {
    /// Attribute accessor used by every driver
    pub attrs: Arc<dyn AttributeAccessor>,
    /// Signal-line backend for monitor threads
    pub lines: Arc<dyn SignalLines>,
    /// External property tables
    pub properties: Option<Arc<dyn PropertyLoader>>,
    /// Interval at which monitor threads check for cancellation
    pub poll_interval: Duration,
}

impl LedgerContext {
    /// Real sysfs accessor with the configured signal backend.
    pub fn from_settings(settings: &LedgerSettings) -> Self {
        Self {
            attrs: Arc::new(SysfsAccessor),
            lines: irq::lines_for(settings.irq_backend),
            properties: None,
            poll_interval: Duration::from_millis(settings.irq_poll_ms),
        }
    }

    /// Attach an external property loader.
    pub fn with_properties(mut self, loader: Arc<dyn PropertyLoader>) -> Self {
        self.properties = Some(loader);
        self
    }
}

/// Outcome of registering one descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationReport {
    /// Identity the descriptor produced
    pub obj: DeviceObject,
    /// Per-device result
    pub result: Result<(), LedgerError>,
}

struct LedgerShared {
    partitions: [Mutex<List<Device>>; DeviceType::ALL.len()],
    drivers: DriverRegistry,
    env: DriverEnv,
}

impl LedgerShared {
    fn partition(&self, device_type: DeviceType) -> &Mutex<List<Device>> {
        &self.partitions[device_type as usize]
    }

    fn find(&self, obj: &DeviceObject) -> Option<Device> {
        self.partition(obj.device_type)
            .lock()
            .search(&Device::probe(obj.clone()))
    }

    fn route_irq(&self, source: &IrqSource) {
        let Some(dev) = self.find(&source.obj) else {
            debug!("IRQ for unknown device {}", source.obj);
            return;
        };
        let Some(callback) = dev.callback.clone() else {
            trace!("IRQ for {} ignored, no application callback", dev.obj);
            return;
        };
        let Some(confirm) = dev.driver.and_then(|ops| ops.confirm_irq) else {
            return;
        };

        match confirm(&self.env, &dev, &source.path) {
            Ok(events) if events.is_empty() => {}
            Ok(events) => {
                debug!("{}: delivering {} alert event(s)", dev.obj, events.len());
                callback(&dev.obj, &events);
            }
            Err(e) => warn!("IRQ evaluation failed for {}: {}", source, e),
        }
    }
}

/// Registry of devices, partitioned by category.
///
/// Cloning shares the ledger.
#[derive(Clone)]
pub struct Ledger {
    shared: Arc<LedgerShared>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new(drivers: DriverRegistry, ctx: LedgerContext) -> Self {
        let irqs = InterruptRegistry::new(ctx.lines, ctx.poll_interval);
        let env = DriverEnv {
            attrs: ctx.attrs,
            properties: ctx.properties,
            irqs,
        };
        info!(
            "Ledger created with {} driver table(s), irq poll {:?}",
            drivers.len(),
            ctx.poll_interval
        );
        Self {
            shared: Arc::new(LedgerShared {
                partitions: std::array::from_fn(|_| Mutex::new(List::new(same_device))),
                drivers,
                env,
            }),
        }
    }

    // ─── Registration ───────────────────────────────────────────────

    /// Register every descriptor of a module.
    ///
    /// Each descriptor is reported on its own; a failure does not stop the
    /// rest of the batch. Registering a device that is already present
    /// succeeds without re-running the driver's `init`.
    pub fn register(
        &self,
        module_id: &str,
        descriptors: &[DeviceDescriptor],
    ) -> Vec<RegistrationReport> {
        descriptors
            .iter()
            .map(|desc| {
                let obj = desc.object(module_id);
                let result = self.register_device(module_id, desc);
                match &result {
                    Ok(()) => info!("Registered {}", obj),
                    Err(e) => error!("Failed to register {}: {}", obj, e),
                }
                RegistrationReport { obj, result }
            })
            .collect()
    }

    fn register_device(&self, module_id: &str, desc: &DeviceDescriptor) -> Result<(), LedgerError> {
        let mut dev = Device::from_descriptor(module_id, desc);
        let mut devices = self.shared.partition(dev.obj.device_type).lock();
        if devices.contains(&dev) {
            debug!("{} already in ledger", dev.obj);
            return Ok(());
        }

        let ops = self
            .shared
            .drivers
            .lookup(&dev.obj)
            .ok_or_else(|| LedgerError::ApiNotSupported {
                op: "driver lookup",
                driver: dev.obj.name.clone(),
            })?;
        dev.driver = Some(ops);

        let init = ops
            .init
            .ok_or_else(|| LedgerError::DriverMissing(dev.obj.to_string()))?;
        init(&self.shared.env, &mut dev)?;

        if let Some(register_callback) = ops.register_callback {
            register_callback(&mut dev, self.irq_route())?;
        }
        devices.append(dev);
        Ok(())
    }

    fn irq_route(&self) -> IrqCallback {
        let shared: Weak<LedgerShared> = Arc::downgrade(&self.shared);
        Arc::new(move |source: &IrqSource| {
            if let Some(shared) = shared.upgrade() {
                shared.route_irq(source);
            }
        })
    }

    /// Number of devices registered in a category.
    pub fn registered_count(&self, device_type: DeviceType) -> usize {
        self.shared.partition(device_type).lock().len()
    }

    /// Identities of the devices registered in a category.
    pub fn registered_devices(&self, device_type: DeviceType) -> Vec<DeviceObject> {
        self.shared
            .partition(device_type)
            .lock()
            .iter()
            .map(|d| d.obj.clone())
            .collect()
    }

    /// Snapshot of a registered device.
    pub fn device(&self, obj: &DeviceObject) -> Option<Device> {
        self.shared.find(obj)
    }

    // ─── Device operations ──────────────────────────────────────────

    fn with_device<R>(
        &self,
        obj: &DeviceObject,
        op: impl FnOnce(&DriverEnv, &Device) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let dev = self
            .shared
            .find(obj)
            .ok_or_else(|| LedgerError::DeviceMissing(obj.to_string()))?;
        op(&self.shared.env, &dev)
    }

    /// Number of properties of a device.
    pub fn read_property_count(&self, obj: &DeviceObject) -> Result<usize, LedgerError> {
        self.with_device(obj, |_, dev| dispatch::read_prop_count(dev))
    }

    /// Property table of a device.
    pub fn read_properties(&self, obj: &DeviceObject) -> Result<PropertyTable, LedgerError> {
        self.with_device(obj, |_, dev| dispatch::read_props(dev))
    }

    /// Write a configuration property.
    pub fn configure(
        &self,
        obj: &DeviceObject,
        index: usize,
        value: &Value,
    ) -> Result<(), LedgerError> {
        self.with_device(obj, |env, dev| dispatch::configure(env, dev, index, value))
    }

    /// Read a property.
    pub fn read(&self, obj: &DeviceObject, index: usize) -> Result<Value, LedgerError> {
        self.with_device(obj, |env, dev| dispatch::read(env, dev, index))
    }

    /// Write a property.
    pub fn write(&self, obj: &DeviceObject, index: usize, value: &Value) -> Result<(), LedgerError> {
        self.with_device(obj, |env, dev| dispatch::write(env, dev, index, value))
    }

    /// Enable a property.
    pub fn enable(&self, obj: &DeviceObject, index: usize) -> Result<(), LedgerError> {
        self.with_device(obj, |env, dev| dispatch::enable(env, dev, index))
    }

    /// Disable a property.
    pub fn disable(&self, obj: &DeviceObject, index: usize) -> Result<(), LedgerError> {
        self.with_device(obj, |env, dev| dispatch::disable(env, dev, index))
    }

    /// Start monitoring an alert property.
    pub fn enable_irq(&self, obj: &DeviceObject, index: usize) -> Result<(), LedgerError> {
        self.with_device(obj, |env, dev| dispatch::enable_irq(env, dev, index))
    }

    /// Stop monitoring an alert property. Blocks until its monitor thread
    /// has exited.
    pub fn disable_irq(&self, obj: &DeviceObject, index: usize) -> Result<(), LedgerError> {
        self.with_device(obj, |env, dev| dispatch::disable_irq(env, dev, index))
    }

    // ─── Application callbacks ──────────────────────────────────────

    /// Set the callback receiving a device's alert events.
    pub fn register_app_callback(
        &self,
        obj: &DeviceObject,
        callback: AppCallback,
    ) -> Result<(), LedgerError> {
        self.set_app_callback(obj, Some(callback))
    }

    /// Clear a device's callback.
    pub fn deregister_app_callback(&self, obj: &DeviceObject) -> Result<(), LedgerError> {
        self.set_app_callback(obj, None)
    }

    fn set_app_callback(
        &self,
        obj: &DeviceObject,
        callback: Option<AppCallback>,
    ) -> Result<(), LedgerError> {
        let missing = || LedgerError::DeviceMissing(obj.to_string());
        let probe = Device::probe(obj.clone());
        let mut devices = self.shared.partition(obj.device_type).lock();
        let mut dev = devices.search(&probe).ok_or_else(missing)?;
        dev.callback = callback;
        devices.update_matching(&probe, dev).map_err(|_| missing())
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Log both registries at TRACE level.
    pub fn dump(&self) {
        for ty in DeviceType::ALL {
            let devices = self.shared.partition(ty).lock();
            trace!("Ledger [{}]: {} device(s)", ty, devices.len());
            for dev in devices.iter() {
                trace!("  {:?}", dev);
            }
        }
        self.shared.env.irqs.dump();
    }

    /// Stop every monitor thread, then release every device.
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        self.shared.env.irqs.shutdown();

        let mut released = 0;
        for ty in DeviceType::ALL {
            let mut devices = self.shared.partition(ty).lock();
            for dev in devices.iter_mut() {
                if let Some(deregister) = dev.driver.and_then(|ops| ops.deregister_callback) {
                    if let Err(e) = deregister(dev) {
                        warn!("{}: failed to remove IRQ route: {}", dev.obj, e);
                    }
                }
            }
            released += devices.len();
            devices.clear();
        }
        if released > 0 {
            info!("Ledger shut down, {} device(s) released", released);
        }
    }

    /// Collaborators handed to driver slots.
    pub fn env(&self) -> &DriverEnv {
        &self.shared.env
    }

    /// Interrupt registry.
    pub fn irqs(&self) -> &InterruptRegistry {
        &self.shared.env.irqs
    }

    /// Driver tables.
    pub fn drivers(&self) -> &DriverRegistry {
        &self.shared.drivers
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Ledger");
        for ty in DeviceType::ALL {
            s.field(&ty.to_string(), &self.registered_count(ty));
        }
        s.field("irqs", &self.irqs().len()).finish()
    }
}
