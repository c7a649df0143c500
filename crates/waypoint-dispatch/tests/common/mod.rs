//! Sample application shared by the integration tests.
//!
//! Every handler writes to a [`Transcript`] instead of stdout, and records
//! its construction, so tests can assert both what ran and how often.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;
use waypoint_dispatch::params::from_pairs;
use waypoint_dispatch::{
    Action, Controller, Dispatcher, HandlerBase, HandlerRegistry, MapperRegistry, MockEnv,
};

// ============================================================================
// Transcript
// ============================================================================

#[derive(Default)]
struct Log {
    output: String,
    built: Vec<String>,
}

#[derive(Clone, Default)]
pub struct Transcript(Arc<Mutex<Log>>);

impl Transcript {
    pub fn write(&self, text: impl AsRef<str>) {
        self.0.lock().output.push_str(text.as_ref());
    }

    fn built(&self, unit: &str) {
        self.0.lock().built.push(unit.to_string());
    }

    pub fn output(&self) -> String {
        self.0.lock().output.clone()
    }

    /// Unit names in construction order.
    pub fn constructions(&self) -> Vec<String> {
        self.0.lock().built.clone()
    }
}

// ============================================================================
// Fixture
// ============================================================================

const UNITS: &[&str] = &[
    "controllers/HogeController.unit",
    "controllers/PreController.unit",
    "controllers/PostController.unit",
    "controllers/OtherController.unit",
    "actions/HogeAction.unit",
    "actions/PreAction.unit",
    "actions/PostAction.unit",
    "actions/ParamAction.unit",
    "actions/Stack1Action.unit",
    "actions/Stack2Action.unit",
    "actions/Stack3Action.unit",
    "actions/Stack4Action.unit",
    "actions/Stack5Action.unit",
    "actions/Stack6Action.unit",
    "actions/DefaultparamAction.unit",
    "actions/FailAction.unit",
    "actions/SpinAction.unit",
    "others/FooController.unit",
    "others/FooAction.unit",
    "others/Sub/BarController.unit",
    "others/Sub/BarAction.unit",
];

/// A handler tree on disk plus the registry of compiled-in handlers.
pub struct Fixture {
    pub dir: TempDir,
    pub transcript: Transcript,
    pub handlers: Arc<HandlerRegistry>,
    pub mappers: MapperRegistry,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        for unit in UNITS {
            let path = dir.path().join(unit);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create unit directory");
            }
            fs::write(&path, "").expect("write unit file");
        }

        let transcript = Transcript::default();
        let handlers = Arc::new(registry(&transcript));
        Self {
            dir,
            transcript,
            handlers,
            mappers: MapperRegistry::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A dispatcher reading `path_info` from a mock environment.
    pub fn dispatcher(&self, id: &str, path_info: &str) -> Dispatcher {
        Dispatcher::new(&self.mappers, id, Arc::clone(&self.handlers))
            .with_env(MockEnv::path_info(path_info))
    }

    pub fn output(&self) -> String {
        self.transcript.output()
    }
}

fn registry(t: &Transcript) -> HandlerRegistry {
    macro_rules! with {
        ($ty:ident) => {{
            let t = t.clone();
            move || $ty::new(&t)
        }};
    }

    HandlerRegistry::new()
        .controller("hoge", with!(HogeController))
        .controller("pre", with!(PreController))
        .controller("post", with!(PostController))
        .controller("other", with!(OtherController))
        .controller("foo", with!(FooController))
        .controller("bar", with!(BarController))
        .action("hoge", with!(HogeAction))
        .action("pre", with!(PreAction))
        .action("post", with!(PostAction))
        .action("param", with!(ParamAction))
        .action("stack1", with!(Stack1Action))
        .action("stack2", with!(Stack2Action))
        .action("stack3", with!(Stack3Action))
        .action("stack4", with!(Stack4Action))
        .action("stack5", with!(Stack5Action))
        .action("stack6", with!(Stack6Action))
        .action("defaultparam", with!(DefaultparamAction))
        .action("fail", with!(FailAction))
        .action("spin", with!(SpinAction))
        .action("foo", with!(FooAction))
        .action("bar", with!(BarAction))
        // Registered but without a unit file.
        .action("ghost", with!(HogeAction))
}

// ============================================================================
// Handlers
// ============================================================================

macro_rules! handler {
    ($name:ident) => {
        pub struct $name {
            base: HandlerBase,
            out: Transcript,
        }

        impl $name {
            fn new(out: &Transcript) -> Self {
                out.built(stringify!($name));
                Self {
                    base: HandlerBase::new(),
                    out: out.clone(),
                }
            }

            fn p(&self, key: &str) -> &str {
                self.base.param_str_or(key, "")
            }
        }
    };
}

macro_rules! base_access {
    () => {
        fn base(&self) -> Option<&HandlerBase> {
            Some(&self.base)
        }

        fn base_mut(&mut self) -> Option<&mut HandlerBase> {
            Some(&mut self.base)
        }
    };
}

handler!(HogeController);

impl Controller for HogeController {
    fn has_action(&self, action: &str) -> bool {
        matches!(
            action,
            "index"
                | "param"
                | "get"
                | "post"
                | "mix"
                | "pathinfogetpost"
                | "stack1"
                | "stack2"
                | "stack3"
                | "stack4"
                | "stack5"
                | "stack6"
                | "fanout"
                | "forwardnul"
                | "getid"
                | "customparams"
                | "getdefaultparam"
                | "loop"
                | "fail"
        )
    }

    fn call_action(&mut self, action: &str) -> anyhow::Result<()> {
        match action {
            "index" => self.out.write("HogeController_indexAction"),
            "param" => self.out.write(self.p("foo")),
            "get" => self.out.write(self.p("bar")),
            "post" => self.out.write(self.p("fuga")),
            "mix" => self.out.write(format!("{}_{}", self.p("hoge"), self.p("foo"))),
            "pathinfogetpost" => self.out.write(format!(
                "{}_{}_{}",
                self.p("hoge"),
                self.p("foo"),
                self.p("baz")
            )),
            "stack1" => {
                self.base.action_stack("stack2", None, None);
            }
            "stack2" => self.out.write("HogeController_stack2Action"),
            "stack3" => {
                self.base
                    .action_stack("stack4", None, Some(from_pairs([("foo", "bar")])));
            }
            "stack4" => self.out.write(self.p("foo")),
            "stack5" => {
                self.base.action_stack("index", Some("other"), None);
            }
            "stack6" => {
                self.base
                    .action_stack("show", Some("other"), Some(from_pairs([("foo", "foo")])));
            }
            "fanout" => {
                self.base
                    .action_stack("stack4", None, Some(from_pairs([("foo", "first")])))
                    .action_stack("show", Some("other"), None);
            }
            "forwardnul" => {
                self.base
                    .action_stack("stack4", None, Some(from_pairs([("foo", "a\0b")])));
            }
            "getid" => self.out.write(format!("id={}", self.p("id"))),
            "customparams" => {
                self.out
                    .write(format!("id={}, name={}", self.p("id"), self.p("name")))
            }
            "getdefaultparam" => self.out.write(self.base.param_str_or("hoge", "fuga")),
            "loop" => {
                self.base.action_stack("loop", None, None);
            }
            "fail" => anyhow::bail!("hoge failed"),
            _ => unreachable!("has_action guards {action}"),
        }
        Ok(())
    }

    base_access!();
}

handler!(PreController);

impl Controller for PreController {
    fn has_action(&self, action: &str) -> bool {
        action == "index"
    }

    fn call_action(&mut self, _action: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn pre_dispatch(&mut self) -> anyhow::Result<()> {
        self.out.write("PreController_preDispatch");
        Ok(())
    }

    base_access!();
}

handler!(PostController);

impl Controller for PostController {
    fn has_action(&self, action: &str) -> bool {
        action == "index"
    }

    fn call_action(&mut self, _action: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn post_dispatch(&mut self) -> anyhow::Result<()> {
        self.out.write("PostController_postDispatch");
        Ok(())
    }

    base_access!();
}

handler!(OtherController);

impl Controller for OtherController {
    fn has_action(&self, action: &str) -> bool {
        matches!(action, "index" | "show")
    }

    fn call_action(&mut self, action: &str) -> anyhow::Result<()> {
        match action {
            "index" => self.out.write("OtherController_indexAction"),
            _ => self.out.write(self.p("foo")),
        }
        Ok(())
    }

    base_access!();
}

handler!(FooController);

impl Controller for FooController {
    fn has_action(&self, action: &str) -> bool {
        action == "index"
    }

    fn call_action(&mut self, _action: &str) -> anyhow::Result<()> {
        self.out.write("FooController_indexAction");
        Ok(())
    }
}

handler!(BarController);

impl Controller for BarController {
    fn has_action(&self, action: &str) -> bool {
        action == "index"
    }

    fn call_action(&mut self, _action: &str) -> anyhow::Result<()> {
        self.out.write("BarController_indexAction");
        Ok(())
    }
}

macro_rules! writing_action {
    ($name:ident, $text:expr) => {
        handler!($name);

        impl Action for $name {
            fn execute(&mut self) -> anyhow::Result<()> {
                self.out.write($text);
                Ok(())
            }

            base_access!();
        }
    };
}

writing_action!(HogeAction, "HogeAction_execute");
writing_action!(Stack2Action, "Stack2Action_execute");
writing_action!(FooAction, "FooAction_execute");
writing_action!(BarAction, "BarAction_execute");

handler!(PreAction);

impl Action for PreAction {
    fn execute(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn pre_execute(&mut self) -> anyhow::Result<()> {
        self.out.write("PreAction_preExecute");
        Ok(())
    }
}

handler!(PostAction);

impl Action for PostAction {
    fn execute(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn post_execute(&mut self) -> anyhow::Result<()> {
        self.out.write("PostAction_postExecute");
        Ok(())
    }
}

handler!(ParamAction);

impl Action for ParamAction {
    fn execute(&mut self) -> anyhow::Result<()> {
        let text = format!("{}{}{}", self.p("hoge"), self.p("foo"), self.p("baz"));
        self.out.write(text);
        Ok(())
    }

    base_access!();
}

handler!(Stack1Action);

impl Action for Stack1Action {
    fn execute(&mut self) -> anyhow::Result<()> {
        self.base.action_stack("stack2", None, None);
        Ok(())
    }

    base_access!();
}

handler!(Stack3Action);

impl Action for Stack3Action {
    fn execute(&mut self) -> anyhow::Result<()> {
        self.base
            .action_stack("stack4", None, Some(from_pairs([("foo", "bar")])));
        Ok(())
    }

    base_access!();
}

handler!(Stack4Action);

impl Action for Stack4Action {
    fn execute(&mut self) -> anyhow::Result<()> {
        self.out.write(self.p("foo"));
        Ok(())
    }

    base_access!();
}

handler!(Stack5Action);

impl Action for Stack5Action {
    fn execute(&mut self) -> anyhow::Result<()> {
        self.base
            .action_stack("stack6", None, Some(from_pairs([("foo", "bar")])));
        Ok(())
    }

    base_access!();
}

handler!(Stack6Action);

impl Action for Stack6Action {
    fn execute(&mut self) -> anyhow::Result<()> {
        self.out.write(format!("{}_{}", self.p("hoge"), self.p("foo")));
        Ok(())
    }

    base_access!();
}

handler!(DefaultparamAction);

impl Action for DefaultparamAction {
    fn execute(&mut self) -> anyhow::Result<()> {
        self.out.write(self.base.param_str_or("foo", "bar"));
        Ok(())
    }

    base_access!();
}

handler!(FailAction);

impl Action for FailAction {
    fn execute(&mut self) -> anyhow::Result<()> {
        self.out.write("FailAction_execute");
        Ok(())
    }

    fn pre_execute(&mut self) -> anyhow::Result<()> {
        anyhow::bail!("not allowed")
    }
}

handler!(SpinAction);

impl Action for SpinAction {
    fn execute(&mut self) -> anyhow::Result<()> {
        self.base.action_stack("spin", None, None);
        Ok(())
    }

    base_access!();
}
