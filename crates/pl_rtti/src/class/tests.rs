use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::sync::atomic::{AtomicUsize, Ordering};

use serde_core::de::DeserializeSeed;

use crate::class::{Access, ClassBuilder, ClassType};
use crate::derive::Object;
use crate::event::{Signal, Slot};
use crate::object::{CallError, DynParams, Object, ObjectError, ObjectExt, ObjectRef};
use crate::plugin::{ModuleRegistrar, ModuleTable, PluginModule, ScanOptions};
use crate::registry::{ClassManager, IncludeBase, ModuleInfo, Recursion, RegisterError};
use crate::serialize::{DefaultValue, ObjectValues, ObjectValuesSeed, XmlElement};
use crate::types::Value;

// -----------------------------------------------------------------------------
// Fixtures

#[derive(Default, Object)]
#[rtti(namespace = "Test", description = "A widget", default_constructor)]
#[rtti(property(Icon = "widget.png"))]
struct Widget {
    #[rtti(attribute, description = "Number of things")]
    count: i32,
    #[rtti(attribute, default = "Untitled")]
    title: String,
}

#[derive(Default, Object)]
#[rtti(namespace = "Test", default_constructor)]
struct Base {
    #[rtti(attribute, default = "1")]
    a: i32,
    #[rtti(attribute, default = "2")]
    b: i32,
}

#[derive(Default, Object)]
#[rtti(namespace = "Test", default_constructor)]
struct Derived {
    #[rtti(base)]
    base: Base,
    #[rtti(attribute = "B", default = "20")]
    shadow_b: i32,
    #[rtti(attribute)]
    c: i32,
    #[rtti(attribute, read_only)]
    version: u32,
}

#[derive(Default, Object)]
#[rtti(namespace = "Test", default_constructor)]
struct MoreDerived {
    #[rtti(base)]
    base: Derived,
}

#[derive(Default, Object)]
#[rtti(name = "Foo", namespace = "Dup")]
struct FirstFoo;

#[derive(Default, Object)]
#[rtti(name = "Foo", namespace = "Dup")]
struct SecondFoo;

#[derive(Default, Object)]
#[rtti(namespace = "Test", default_constructor, extend = calc_methods)]
struct Calc {
    calls: u32,
}

impl Calc {
    fn add(&mut self, a: i32, b: i32) -> i32 {
        self.calls += 1;
        a + b
    }

    fn calls(&self) -> u32 {
        self.calls
    }
}

fn calc_methods(builder: ClassBuilder<Calc>) -> ClassBuilder<Calc> {
    builder
        .method("Add", Calc::add)
        .method("Calls", Calc::calls)
}

#[derive(Default, Object)]
#[rtti(namespace = "Test", default_constructor)]
struct Sender {
    #[rtti(signal)]
    fired: Signal<(i32,)>,
}

#[derive(Default, Object)]
#[rtti(namespace = "Test", default_constructor)]
struct Receiver {
    #[rtti(attribute)]
    total: i32,
    #[rtti(slot = "OnFired", handler = Receiver::on_fired)]
    fired_slot: Slot<(i32,)>,
}

impl Receiver {
    fn on_fired(&mut self, (value,): &(i32,)) {
        self.total += value;
    }
}

#[derive(Default, Object)]
#[rtti(namespace = "Test", default_constructor)]
struct Echo {
    #[rtti(attribute)]
    total: i32,
    #[rtti(signal)]
    ping: Signal<(i32,)>,
    #[rtti(slot = "OnPing", handler = Echo::on_ping)]
    ping_slot: Slot<(i32,)>,
}

impl Echo {
    fn on_ping(&mut self, (value,): &(i32,)) {
        self.total += value;
    }
}

#[derive(Default, Object)]
#[rtti(namespace = "Test", default_constructor)]
struct Transient {
    #[rtti(attribute)]
    value: i32,
}

#[derive(Default, Object)]
#[rtti(namespace = "Plugin", default_constructor)]
struct PluginWidget;

#[derive(Default, Object)]
#[rtti(namespace = "Plugin", default_constructor)]
struct NestedPluginWidget;

fn register_demo(registrar: &mut ModuleRegistrar<'_>) {
    registrar.register::<PluginWidget>();
}

fn register_nested(registrar: &mut ModuleRegistrar<'_>) {
    registrar.register::<NestedPluginWidget>();
}

#[derive(Default, Object)]
#[rtti(namespace = "Local")]
struct LocalParent {
    #[rtti(attribute)]
    depth: i32,
}

/// Names its base instead of linking the type.
#[derive(Default)]
struct LocalChild;

impl Object for LocalChild {
    fn class(&self) -> crate::class::ClassRef {
        Self::static_class()
    }
}

impl ClassType for LocalChild {
    fn build_class() -> crate::class::Class {
        ClassBuilder::<Self>::new("LocalChild")
            .namespace("Local")
            .base_name("LocalParent")
            .build()
    }

    fn static_class() -> crate::class::ClassRef {
        static CELL: crate::class::ClassCell = crate::class::ClassCell::new();
        CELL.get_or_build::<Self>()
    }
}

fn counter_slot<A: crate::event::EventArgs>() -> (Arc<AtomicUsize>, Slot<A>) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    let slot = Slot::new(move |_: &A| {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    (count, slot)
}

fn names(classes: Vec<crate::class::ClassRef>) -> Vec<String> {
    classes.iter().map(|c| String::from(c.full_name())).collect()
}

fn attribute_names(class: &crate::class::Class) -> Vec<&'static str> {
    class.attributes().iter().map(|a| a.name()).collect()
}

// -----------------------------------------------------------------------------
// Class metadata

#[test]
fn derived_class_metadata() {
    let class = Widget::static_class();
    assert_eq!(class.name(), "Widget");
    assert_eq!(class.full_name(), "Test::Widget");
    assert_eq!(class.description(), "A widget");
    assert_eq!(class.property("Icon"), Some("widget.png"));
    assert_eq!(class.type_id(), Some(TypeId::of::<Widget>()));
    assert!(!class.is_abstract());
    assert!(Arc::ptr_eq(&class, &Widget::default().class()));

    let count = class.attribute("Count").unwrap();
    assert_eq!(count.type_info().name(), "int32");
    assert_eq!(count.description(), "Number of things");
    assert_eq!(count.access(), Access::ReadWrite);
    assert_eq!(class.attribute("Title").unwrap().default_value(), "Untitled");
    assert!(FirstFoo::static_class().is_abstract());
}

#[test]
fn members_merge_base_first_with_shadowing() {
    let class = Derived::static_class();
    assert_eq!(attribute_names(&class), ["A", "B", "C", "Version"]);
    assert_eq!(class.attribute("B").unwrap().default_value(), "20");
    assert_eq!(attribute_names(&MoreDerived::static_class()), ["A", "B", "C", "Version"]);

    // Root methods are inherited by every class.
    assert!(class.method("GetValues").is_some());
    assert!(class.own_methods().is_empty());
}

#[test]
fn derivation_is_reflexive_and_transitive() {
    let derived = MoreDerived::static_class();
    assert!(derived.is_derived_from("Test::MoreDerived"));
    assert!(derived.is_derived_from("Test::Derived"));
    assert!(derived.is_derived_from("Test::Base"));
    assert!(derived.is_derived_from("PLCore::Object"));
    assert!(derived.is_derived_from_class(&Base::static_class()));
    assert!(!Base::static_class().is_derived_from("Test::Derived"));

    let chain: Vec<String> = derived
        .base_chain()
        .iter()
        .map(|c| String::from(c.full_name()))
        .collect();
    assert_eq!(chain, ["Test::Derived", "Test::Base", "PLCore::Object"]);
}

#[test]
fn named_base_resolves_in_local_manager() {
    let manager = ClassManager::new();
    manager.register::<LocalChild>().unwrap();
    manager.register::<LocalParent>().unwrap();

    let child = LocalChild::static_class();
    assert_eq!(child.base_name().as_deref(), Some("LocalParent"));
    assert!(child.is_derived_from("Local::LocalParent"));
    assert!(child.is_derived_from("PLCore::Object"));
    assert_eq!(attribute_names(&child), ["Depth"]);
    assert_eq!(
        names(manager.derived_classes("LocalParent", Recursion::Direct, IncludeBase::Exclude)),
        ["Local::LocalChild"]
    );
}

// -----------------------------------------------------------------------------
// Registry

#[test]
fn duplicate_full_name_keeps_first() {
    let manager = ClassManager::new();
    manager.register::<FirstFoo>().unwrap();
    assert_eq!(
        manager.register::<SecondFoo>(),
        Err(RegisterError::DuplicateClass(String::from("Dup::Foo")))
    );
    // Registering the same class again is not an error.
    assert_eq!(manager.register::<FirstFoo>(), Ok(()));

    let class = manager.get_class("Dup::Foo").unwrap();
    assert_eq!(class.type_id(), Some(TypeId::of::<FirstFoo>()));
    assert!(manager.get_class_by_type(TypeId::of::<SecondFoo>()).is_none());
}

#[test]
fn lookup_and_derived_classes() {
    let manager = ClassManager::new();
    manager.register::<Base>().unwrap();
    manager.register::<Derived>().unwrap();
    manager.register::<MoreDerived>().unwrap();

    assert_eq!(manager.len(), 4);
    assert!(manager.contains("Derived"));
    assert!(manager.contains("PLCore::Object"));
    assert!(manager.get_class("Missing").is_none());

    assert_eq!(
        names(manager.derived_classes("Test::Base", Recursion::Recursive, IncludeBase::Exclude)),
        ["Test::Derived", "Test::MoreDerived"]
    );
    assert_eq!(
        names(manager.derived_classes("Base", Recursion::Direct, IncludeBase::Include)),
        ["Test::Base", "Test::Derived"]
    );
}

#[test]
fn create_by_name() {
    let manager = ClassManager::new();
    manager.register::<Widget>().unwrap();
    manager.register::<FirstFoo>().unwrap();

    let widget = manager.create("Test::Widget").unwrap();
    assert!(widget.is::<Widget>());
    assert!(widget.is_instance_of("PLCore::Object"));
    assert_eq!(widget.with_as(|w: &Widget| w.count), Ok(Some(0)));

    assert!(manager.create("Dup::Foo").is_none());
    assert!(manager.create("Missing").is_none());
}

#[test]
fn unregistered_module_invalidates_class() {
    let manager = ClassManager::new();
    let module = manager.register_module(ModuleInfo::new("Temporary"));
    manager
        .register_class_in(module, Transient::static_class())
        .unwrap();
    assert_eq!(manager.classes_of_module(module).len(), 1);

    let object = manager.create("Transient").unwrap();
    assert!(object.class().is_ok());

    let removed = manager.unregister_module(module).unwrap();
    assert_eq!(removed.len(), 1);
    assert!(!manager.contains("Test::Transient"));
    assert_eq!(
        object.class().err(),
        Some(ObjectError::ClassUnregistered(String::from("Test::Transient")))
    );
    // The instance itself stays usable.
    assert_eq!(object.with_as(|t: &Transient| t.value), Ok(Some(0)));
    assert!(matches!(
        manager.unregister_module(module),
        Err(RegisterError::UnknownModule(_))
    ));
}

// -----------------------------------------------------------------------------
// Attributes and values

#[test]
fn widget_values() {
    let mut widget = Widget {
        count: 42,
        title: String::from("Untitled"),
    };
    assert_eq!(widget.get_values(DefaultValue::NoDefault), "Count='42'");
    assert_eq!(
        widget.get_values(DefaultValue::WithDefault),
        "Count='42' Title='Untitled'"
    );

    widget.set_values("Title='It\\'s' Unknown='1' Count='3'");
    assert_eq!(widget.count, 3);
    assert_eq!(widget.title, "It's");

    widget.set_default_values();
    assert_eq!(widget.count, 0);
    assert_eq!(widget.title, "Untitled");
    assert_eq!(widget.get_values(DefaultValue::NoDefault), "");
}

#[test]
fn values_round_trip_through_base() {
    let mut source = Derived::default();
    source.set_default_values();
    assert_eq!(source.base.a, 1);
    assert_eq!(source.shadow_b, 20);
    assert_eq!(source.base.b, 0);

    source.set_values("A='5' B='6' C='9'");
    let values = source.get_values(DefaultValue::NoDefault);
    assert_eq!(values, "A='5' B='6' C='9'");

    let mut copy = Derived::default();
    copy.set_values(&values);
    assert_eq!(copy.get_values(DefaultValue::WithDefault), source.get_values(DefaultValue::WithDefault));
}

#[test]
fn created_objects_start_at_defaults() {
    let fresh = Widget::static_class().create().unwrap();
    assert_eq!(fresh.with_as(|w: &Widget| w.title.clone()), Ok(Some(String::from("Untitled"))));
    fresh
        .with_mut(|object| {
            assert!(object.get_attribute("Title").unwrap().is_default());
            assert_eq!(object.get_values(DefaultValue::NoDefault), "");
        })
        .unwrap();

    // Values left at their default are omitted and still restored.
    let source = Widget {
        count: 42,
        title: String::from("Untitled"),
    };
    let values = source.get_values(DefaultValue::NoDefault);
    assert_eq!(values, "Count='42'");

    let copy = Widget::static_class().create().unwrap();
    let restored = copy
        .with_mut(|object| {
            object.set_values(&values);
            object.get_values(DefaultValue::WithDefault)
        })
        .unwrap();
    assert_eq!(restored, source.get_values(DefaultValue::WithDefault));

    let derived = Derived::static_class().create().unwrap();
    assert_eq!(
        derived.with_as(|d: &Derived| (d.base.a, d.shadow_b)),
        Ok(Some((1, 20)))
    );
}

#[test]
fn dynamic_attribute_access() {
    let mut derived = Derived::default();

    let mut var = derived.get_attribute("A").unwrap();
    assert_eq!(var.type_info().name(), "int32");
    assert!(var.set_string("12"));
    assert_eq!(var.get_int(), 12);
    assert_eq!(derived.base.a, 12);

    assert!(derived.set_attribute_value("C", &Value::Double(3.7)));
    assert_eq!(derived.c, 3);
    assert_eq!(derived.get_attribute_value("C"), Some(Value::Int(3)));

    // Read-only and unknown attributes are not written.
    assert!(!derived.set_attribute("Version", "9"));
    assert!(!derived.set_attribute("Missing", "1"));
    assert_eq!(derived.get_attribute_string("Missing"), None);
    assert!(!derived.set_attribute_var("A", None));
    assert_eq!(derived.base.a, 12);

    assert!(derived.set_attribute_default("A"));
    assert_eq!(derived.base.a, 1);
}

#[test]
fn set_attribute_from_other_var() {
    let mut source = Widget {
        count: 11,
        title: String::new(),
    };
    let mut target = Widget::default();
    let var = source.get_attribute("Count").unwrap();
    assert!(target.set_attribute_var("Count", Some(&var)));
    assert_eq!(target.count, 11);
}

// -----------------------------------------------------------------------------
// Methods

#[test]
fn call_method_by_name() {
    let mut calc = Calc::default();
    let class = calc.class();
    assert_eq!(class.method("Add").unwrap().signature(), "int32(int32,int32)");
    assert_eq!(class.method("Calls").unwrap().signature(), "uint32()");

    let mut params = DynParams::new().with(2i32).with(3i32);
    calc.call_method("Add", &mut params).unwrap();
    assert_eq!(params.return_value(), &Value::Int(5));

    assert_eq!(calc.call_method_string("Add", "Param0='4' Param1='6'").unwrap(), "10");
    assert_eq!(calc.call_method_string("Calls", "").unwrap(), "2");

    let mut func = calc.get_method("Add").unwrap();
    assert_eq!(func.call_string("Param0='1' Param1='1'").unwrap(), "2");
}

#[test]
fn call_method_errors() {
    let mut calc = Calc::default();
    let mut params = DynParams::new();
    assert_eq!(
        calc.call_method("Missing", &mut params),
        Err(CallError::UnknownMethod(String::from("Missing")))
    );

    let mut params = DynParams::new().with(1i32);
    assert!(matches!(
        calc.call_method("Add", &mut params),
        Err(CallError::ParamCount { expected: 2, found: 1, .. })
    ));
    assert_eq!(calc.calls, 0);
}

#[test]
fn root_methods_drive_any_object() {
    let mut widget = Widget::default();

    let mut params = DynParams::new().with("Count").with("7");
    widget.call_method("SetAttribute", &mut params).unwrap();
    assert_eq!(widget.count, 7);

    assert_eq!(widget.call_method_string("GetAttribute", "Param0='Count'").unwrap(), "7");
    assert_eq!(
        widget.call_method_string("GetValues", "Param0='NoDefault'").unwrap(),
        "Count='7' Title=''"
    );
    assert_eq!(
        widget.call_method_string("IsInstanceOf", "Param0='PLCore::Object'").unwrap(),
        "true"
    );

    widget.call_method_string("SetValues", "Param0=\"Title='Hello'\"").unwrap();
    assert_eq!(widget.title, "Hello");

    widget.call_method_string("SetDefaultValues", "").unwrap();
    assert_eq!(widget.count, 0);
    assert_eq!(widget.title, "Untitled");
}

#[test]
fn constructors() {
    let class = Widget::static_class();
    let object = class.create().unwrap();
    assert!(object.is::<Widget>());

    assert!(matches!(
        class.create_with("Missing", &DynParams::new()),
        Err(CallError::NoConstructor { .. })
    ));
    assert!(Transient::static_class().constructor("DefaultConstructor").is_some());
}

// -----------------------------------------------------------------------------
// Reference counting

#[test]
fn reference_count_destroys_once() {
    let object = ObjectRef::new(Widget::default());
    let (destroyed, slot) = counter_slot::<()>();
    object.on_destroyed().connect(&slot);

    const N: u32 = 4;
    for i in 0..N {
        assert_eq!(object.add_reference(), i + 2);
    }
    assert_eq!(object.reference_count(), N + 1);

    for i in (0..=N).rev() {
        assert_eq!(object.release(), i);
    }
    assert!(object.is_destroyed());
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);

    // Further calls are checked no-ops.
    assert_eq!(object.release(), 0);
    assert_eq!(object.add_reference(), 0);
    assert!(!object.destroy());
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    assert_eq!(object.class().err(), Some(ObjectError::Destroyed(object.id())));
}

#[test]
fn soft_release_hands_over_ownership() {
    let object = ObjectRef::new(Widget::default());
    assert_eq!(object.soft_release(), 0);
    assert!(object.is_foreign());
    assert!(!object.is_destroyed());

    // A foreign instance is not destroyed by release.
    assert_eq!(object.release(), 0);
    assert!(!object.is_destroyed());

    let handle = object.clone();
    let foreign = ObjectRef::new(Widget::default()).into_foreign();
    assert!(foreign.get().is_some_and(ObjectRef::is_foreign));
    let inner = foreign.get().cloned().unwrap();
    drop(foreign);
    assert!(inner.is_destroyed());

    assert!(handle.destroy());
    assert!(object.is_destroyed());
}

#[test]
fn foreign_instance_survives_new_references() {
    let object = ObjectRef::new(Widget::default());
    assert_eq!(object.soft_release(), 0);
    assert_eq!(object.add_reference(), 1);
    assert_eq!(object.release(), 0);
    assert!(object.is_foreign());
    assert!(!object.is_destroyed());
    assert!(object.destroy());

    let reclaimed = ObjectRef::new(Widget::default())
        .into_foreign()
        .reclaim()
        .unwrap();
    assert!(!reclaimed.is_foreign());
    assert_eq!(reclaimed.reference_count(), 1);
    assert_eq!(reclaimed.release(), 0);
    assert!(reclaimed.is_destroyed());
}

// -----------------------------------------------------------------------------
// Events

#[test]
fn signal_with_n_connections_invokes_n_times() {
    let sender = ObjectRef::new(Sender::default());
    let receiver = ObjectRef::new(Receiver::default());

    const N: usize = 3;
    for _ in 0..N {
        sender.connect("Fired", &receiver, "OnFired").unwrap();
    }

    sender
        .with(|object| {
            let event = object.get_signal("Fired").unwrap();
            assert_eq!(event.signature(), "void(int32)");
            assert_eq!(event.connection_count(), N);
            event.emit(&[Value::Int(2)])
        })
        .unwrap()
        .unwrap();
    assert_eq!(receiver.with_as(|r: &Receiver| r.total), Ok(Some(2 * N as i32)));

    assert_eq!(sender.disconnect("Fired", &receiver, "OnFired"), Ok(true));
    assert_eq!(sender.disconnect("Fired", &receiver, "OnFired"), Ok(false));
    assert!(matches!(
        sender.connect("Missing", &receiver, "OnFired"),
        Err(ObjectError::UnknownSignal(_))
    ));
}

#[test]
fn destroyed_receiver_is_never_invoked() {
    let sender = ObjectRef::new(Sender::default());
    let receiver = ObjectRef::new(Receiver::default());
    sender.connect("Fired", &receiver, "OnFired").unwrap();

    assert!(receiver.destroy());
    sender
        .with_as(|s: &Sender| {
            s.fired.emit((5,));
            s.fired.connection_count()
        })
        .unwrap();
    assert!(receiver.with(|_| ()).is_err());
}

#[test]
fn dynamic_slot_invocation() {
    let receiver = ObjectRef::new(Receiver::default());
    receiver
        .with(|object| {
            let handler = object.get_slot("OnFired").unwrap();
            assert_eq!(handler.signature(), "void(int32)");
            handler.invoke(&[Value::Int(1)])
        })
        .unwrap()
        .unwrap();
    // Runs once the access that held the receiver has ended.
    assert_eq!(receiver.with_as(|r: &Receiver| r.total), Ok(Some(1)));
}

#[test]
fn self_connected_slot_is_delivered() {
    let echo = ObjectRef::new(Echo::default());
    echo.connect("Ping", &echo, "OnPing").unwrap();

    echo.with(|object| object.get_signal("Ping").unwrap().emit(&[Value::Int(5)]))
        .unwrap()
        .unwrap();
    assert_eq!(echo.with_as(|e: &Echo| e.total), Ok(Some(5)));

    echo.with_as_mut(|e: &mut Echo| e.ping.emit((2,))).unwrap();
    assert_eq!(echo.with_as(|e: &Echo| e.total), Ok(Some(7)));
}

// -----------------------------------------------------------------------------
// XML and serde

#[test]
fn xml_round_trip() {
    let manager = ClassManager::new();
    manager.register::<Widget>().unwrap();

    let widget = Widget {
        count: 8,
        title: String::from("A <b>"),
    };
    let element = widget.to_xml(DefaultValue::NoDefault);
    assert_eq!(element.attribute("Class"), Some("Test::Widget"));

    let parsed = XmlElement::parse(&element.to_string()).unwrap();
    let copy = manager.create_from_xml(&parsed).unwrap();
    assert_eq!(
        copy.with_as(|w: &Widget| (w.count, w.title.clone())),
        Ok(Some((8, String::from("A <b>"))))
    );
}

#[test]
fn serde_round_trip() {
    let widget = Widget {
        count: 4,
        title: String::from("Serde"),
    };
    let json = serde_json::to_string(&ObjectValues::new(&widget, DefaultValue::WithDefault)).unwrap();
    assert_eq!(json, r#"{"Count":"4","Title":"Serde"}"#);

    let mut copy = Widget::default();
    let mut deserializer = serde_json::Deserializer::from_str(r#"{"Count":12,"Title":"Json","Other":true}"#);
    ObjectValuesSeed::new(&mut copy)
        .deserialize(&mut deserializer)
        .unwrap();
    assert_eq!(copy.count, 12);
    assert_eq!(copy.title, "Json");
}

// -----------------------------------------------------------------------------
// Plugins

#[test]
fn scan_plugin_directory() {
    let dir = tempfile::tempdir().unwrap();
    let write = |name: &str, text: &str| std::fs::write(dir.path().join(name), text).unwrap();

    write("a_demo.plugin", "<Plugin><Name>Demo</Name><Vendor>Tests</Vendor></Plugin>");
    write("b_inactive.plugin", "<Plugin><Active>0</Active><Name>Off</Name></Plugin>");
    write("c_missing.plugin", "<Plugin><Name>Missing</Name></Plugin>");
    write("d_broken.plugin", "<Plugin><Name>Broken");
    write("notes.txt", "<Plugin><Name>Ignored</Name></Plugin>");
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    std::fs::write(
        dir.path().join("nested/nested.plugin"),
        "<Plugin><Name>Nested</Name></Plugin>",
    )
    .unwrap();

    let loader = ModuleTable::new()
        .with(PluginModule::new("Demo", register_demo))
        .with(PluginModule::new("Nested", register_nested))
        .with(PluginModule::new("Off", register_demo));

    let flat = ClassManager::new();
    let loaded = flat.scan_plugins(dir.path(), &ScanOptions::default().recursive(false), &loader);
    assert_eq!(loaded.len(), 1);
    assert_eq!(flat.module(loaded[0]).unwrap().vendor, "Tests");
    assert!(flat.contains("Plugin::PluginWidget"));
    assert!(!flat.contains("Plugin::NestedPluginWidget"));

    let manager = ClassManager::new();
    let loaded = manager.scan_plugins(dir.path(), &ScanOptions::default(), &loader);
    assert_eq!(loaded.len(), 2);
    assert!(manager.contains("Plugin::NestedPluginWidget"));
    assert_eq!(manager.modules().len(), 3);

    // A plugin is loaded only once.
    assert!(manager.scan_plugins(dir.path(), &ScanOptions::default(), &loader).is_empty());
}

#[test]
fn incompatible_plugin_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.plugin");
    std::fs::write(&path, "<Plugin><Name>Old</Name></Plugin>").unwrap();

    let loader = ModuleTable::new().with(PluginModule::new("Old", register_demo).with_abi_version(0));
    let manager = ClassManager::new();
    assert!(matches!(
        manager.load_plugin(&path, &loader),
        Err(crate::plugin::PluginError::IncompatibleAbi { found: 0, .. })
    ));
    assert!(manager.find_module("Old").is_none());
}

// -----------------------------------------------------------------------------
// Auto registration

#[cfg(feature = "auto_register")]
#[derive(Default, Object)]
#[rtti(namespace = "Auto", default_constructor, auto_register)]
struct AutoWidget;

#[cfg(feature = "auto_register")]
#[test]
fn auto_registered_classes() {
    let manager = ClassManager::new();
    assert!(manager.auto_register() >= 1);
    assert!(manager.contains("Auto::AutoWidget"));
    assert_eq!(manager.auto_register(), 0);

    assert!(ClassManager::global().contains("Auto::AutoWidget"));
    assert!(ClassManager::global().create("Auto::AutoWidget").is_some());
}

#[cfg(feature = "auto_register")]
#[derive(Default, Object)]
#[rtti(namespace = "Plugin", default_constructor)]
struct StaticPluginWidget;

#[cfg(feature = "auto_register")]
fn register_static(registrar: &mut ModuleRegistrar<'_>) {
    registrar.register::<StaticPluginWidget>();
}

#[cfg(feature = "auto_register")]
crate::plugin_module!("StaticDemo", register_static);

#[cfg(feature = "auto_register")]
#[test]
fn static_plugin_module() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("static.plugin");
    std::fs::write(&path, "<Plugin><Name>StaticDemo</Name></Plugin>").unwrap();

    let manager = ClassManager::new();
    let module = manager
        .load_plugin(&path, &crate::plugin::StaticModuleLoader)
        .unwrap();
    assert_eq!(manager.module(module).unwrap().name, "StaticDemo");
    assert!(manager.contains("Plugin::StaticPluginWidget"));
    assert!(manager.create("StaticPluginWidget").is_some());
}
