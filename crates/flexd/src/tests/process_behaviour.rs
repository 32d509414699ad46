//! Behavioural tests covering launch sequencing and signal-driven shutdown.

use std::cell::RefCell;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use flex_config::{Config, ReceiverKind};
use flex_types::Request;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use signal_hook::consts::signal::SIGTERM;

use crate::completion::CompletionHandler;
use crate::dispatch::FlexService;
use crate::modules::Modules;
use crate::process::{LaunchError, ProcessControl, ServiceRuntime, run_with, supervise};
use crate::registry::RegistryError;
use crate::tests::support::{
    ChannelSignals, CountingTerminator, LifecycleEvent, RecordingReporter, sample_service, wait_for,
};
use crate::transport::EmbeddedEntryPoint;

type StepResult = Result<(), String>;

#[derive(Default)]
struct ProcessWorld {
    config: Config,
    reporter: Arc<RecordingReporter>,
    terminator: CountingTerminator,
    signals: Option<Sender<i32>>,
    runtime: Option<ServiceRuntime>,
    entry_point: Option<EmbeddedEntryPoint>,
    supervised: Option<JoinHandle<Result<(), LaunchError>>>,
    result: Option<Result<(), LaunchError>>,
    _occupied: Option<TcpListener>,
}

impl ProcessWorld {
    fn control(&mut self) -> ProcessControl<ChannelSignals, CountingTerminator> {
        let (signals, sender) = ChannelSignals::pair();
        self.signals = Some(sender);
        ProcessControl {
            signals,
            terminator: self.terminator.clone(),
            reporter: Arc::clone(&self.reporter) as _,
        }
    }

    fn run(&mut self, initialise: impl FnOnce(&mut FlexService) -> Result<(), RegistryError>) {
        let control = self.control();
        self.result = Some(run_with(self.config.clone(), control, initialise));
    }

    fn result(&self) -> Result<&(), &LaunchError> {
        self.result.as_ref().expect("the service ran").as_ref()
    }
}

#[fixture]
fn world() -> RefCell<ProcessWorld> {
    RefCell::new(ProcessWorld::default())
}

fn embedded_config() -> Config {
    Config {
        receiver: ReceiverKind::Embedded,
        ..Config::default()
    }
}

#[given("an embedded service configuration")]
fn given_embedded_config(world: &RefCell<ProcessWorld>) {
    world.borrow_mut().config = embedded_config();
}

#[given("an embedded service runtime")]
fn given_embedded_runtime(world: &RefCell<ProcessWorld>) {
    let mut world = world.borrow_mut();
    let runtime = ServiceRuntime::init(embedded_config(), sample_service())
        .with_reporter(Arc::clone(&world.reporter) as _);
    world.entry_point = runtime.entry_point();
    world.runtime = Some(runtime);
}

#[given("a TCP service configuration on an occupied port")]
fn given_occupied_port(world: &RefCell<ProcessWorld>) -> StepResult {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|error| error.to_string())?;
    let port = listener
        .local_addr()
        .map_err(|error| error.to_string())?
        .port();
    let mut world = world.borrow_mut();
    world.config = Config {
        receiver: ReceiverKind::Tcp,
        host: "127.0.0.1".to_owned(),
        tcp_port: port,
        ..Config::default()
    };
    world._occupied = Some(listener);
    Ok(())
}

#[when("the runtime is supervised")]
fn when_supervised(world: &RefCell<ProcessWorld>) -> StepResult {
    let mut world = world.borrow_mut();
    let runtime = world.runtime.take().ok_or("no runtime built")?;
    let control = world.control();
    world.supervised = Some(thread::spawn(move || supervise(&runtime, control)));
    Ok(())
}

#[when("the runtime is supervised with a termination signal already queued")]
fn when_supervised_after_signal(world: &RefCell<ProcessWorld>) -> StepResult {
    let mut world = world.borrow_mut();
    let runtime = world.runtime.take().ok_or("no runtime built")?;
    let control = world.control();
    world
        .signals
        .as_ref()
        .ok_or("no signal source")?
        .send(SIGTERM)
        .map_err(|error| error.to_string())?;
    world.supervised = Some(thread::spawn(move || supervise(&runtime, control)));
    Ok(())
}

#[when("the embedded entry point answers the health probe")]
fn when_entry_point_answers(world: &RefCell<ProcessWorld>) -> StepResult {
    let world = world.borrow();
    let entry_point = world.entry_point.as_ref().ok_or("no entry point")?;
    let reply = wait_for(|| entry_point.call(br#"{"healthCheck":1}"#).ok())
        .ok_or("entry point never became available")?;
    if reply == br#"{"status":"ready"}"# {
        Ok(())
    } else {
        Err(format!("unexpected reply {}", String::from_utf8_lossy(&reply)))
    }
}

#[when("a termination signal arrives")]
fn when_signal_arrives(world: &RefCell<ProcessWorld>) -> StepResult {
    let world = world.borrow();
    let signals = world.signals.as_ref().ok_or("no signal source")?;
    signals.send(SIGTERM).map_err(|error| error.to_string())
}

#[when("the service runs with a failing registration")]
fn when_failing_registration(world: &RefCell<ProcessWorld>) {
    world.borrow_mut().run(|service| {
        service
            .data
            .service_object("widgets")
            .register(
                "onFrobnicate",
                |_: &Request, complete: CompletionHandler, _: &Modules| complete.ok().done(),
            )
            .map(|_| ())
    });
}

#[when("the service runs with the sample handlers")]
fn when_sample_handlers(world: &RefCell<ProcessWorld>) {
    world.borrow_mut().run(|service| {
        *service = sample_service();
        Ok(())
    });
}

#[then("the supervised run succeeds")]
fn then_supervised_run_succeeds(world: &RefCell<ProcessWorld>) -> StepResult {
    let handle = world
        .borrow_mut()
        .supervised
        .take()
        .ok_or("runtime was not supervised")?;
    wait_for(|| handle.is_finished().then_some(()))
        .ok_or("supervised run did not finish after the signal")?;
    handle
        .join()
        .map_err(|_| "supervisor panicked".to_owned())?
        .map_err(|error| error.to_string())
}

#[then("the lifecycle events end with a completed shutdown")]
fn then_events_end_with_completion(world: &RefCell<ProcessWorld>) {
    let events = world.borrow().reporter.events();
    assert_eq!(
        events,
        vec![
            LifecycleEvent::ReceiverStarted(ReceiverKind::Embedded),
            LifecycleEvent::ShutdownRequested(SIGTERM),
            LifecycleEvent::ShutdownCompleted,
        ]
    );
}

#[then("the terminator was not invoked")]
fn then_terminator_idle(world: &RefCell<ProcessWorld>) {
    assert_eq!(world.borrow().terminator.calls(), 0);
}

#[then("the launch fails with exit code {code}")]
fn then_launch_fails(world: &RefCell<ProcessWorld>, code: u8) {
    let world = world.borrow();
    let error = world.result().expect_err("launch should fail");
    assert_eq!(error.exit_code(), code, "unexpected error: {error}");
}

#[scenario(
    path = "tests/features/service_process.feature",
    name = "A termination signal drains the embedded receiver"
)]
fn signal_drains_embedded_receiver(world: RefCell<ProcessWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/service_process.feature",
    name = "A signal raised before the receiver starts still ends the run"
)]
fn early_signal_ends_the_run(world: RefCell<ProcessWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/service_process.feature",
    name = "A failing registration stops the launch"
)]
fn failing_registration(world: RefCell<ProcessWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/service_process.feature",
    name = "An occupied port fails the launch"
)]
fn occupied_port(world: RefCell<ProcessWorld>) {
    let _ = world;
}
