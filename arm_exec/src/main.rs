//! Main arm executable entry point.
//!
//! # Architecture
//!
//! The executable runs two threads:
//!
//!     - The control loop thread, which owns the cameras and the motor link and runs the
//!       tracking and actuation cycle until the arm is stopped.
//!     - The main thread, which runs the operator console. Console commands request state
//!       transitions from the shared state manager, which the control loop observes at the start
//!       of its next iteration.
//!
//! Stopping (the `stop` command, Ctrl-C or Ctrl-D) moves the state manager to OFF, the control loop
//! then sends the OFF command, releases the equipment and exits, and the main thread joins it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use structopt::StructOpt;

// Internal
use arm_lib::{
    cam_client::ReplayCamPair,
    control_loop::{ControlLoop, Equipment},
    diag_log::DiagLog,
    motor_client::{port_present, SerialMotorPort},
    params::ArmExecParams,
    state_mgr::StateMgr,
    ui::{ConsoleLog, ConsoleUi},
    vision::ColourVision,
};
use comms_if::tc::{OperatorCmd, TcParseError};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "parry $ ";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec", about = "Stereo tracking and control of the Parry arm")]
struct Cli {
    /// Parameter file, relative to the parameters directory
    #[structopt(long, default_value = "arm_exec.toml")]
    params: String,

    /// Minimum log level, at least as verbose as info
    #[structopt(long, default_value = "debug")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    let cli = Cli::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(cli.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Parry Arm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: ArmExecParams =
        util::params::load(&cli.params).wrap_err("Could not load arm_exec params")?;
    params.validate().wrap_err("Invalid arm_exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE EQUIPMENT ----

    if !port_present(&params.motor.port_name) {
        return Err(eyre!(
            "Motor controller serial port {} is not present",
            params.motor.port_name
        ));
    }

    let replay_dir = if params.cam.replay_dir.is_absolute() {
        params.cam.replay_dir.clone()
    } else {
        host::get_sw_root()
            .wrap_err("Could not get the software root")?
            .join(&params.cam.replay_dir)
    };

    let ui = ConsoleUi::new();
    let console_log = ui.log();

    let diag_log_path: PathBuf = session.session_root.join(&params.control.diag_log_name);
    let diag_log = DiagLog::create(&diag_log_path)
        .wrap_err_with(|| format!("Could not create the diagnostic log {:?}", diag_log_path))?;

    let eqpt = Equipment {
        cams: ReplayCamPair::new(replay_dir, &params.cam),
        vision: ColourVision::new(params.vision.clone()),
        motor_port: SerialMotorPort::new(&params.motor),
        ui,
        diag_log,
    };

    // ---- START CONTROL LOOP ----

    let state_mgr = Arc::new(StateMgr::new());
    state_mgr.standby();

    let mut control_loop = ControlLoop::new(&params, state_mgr.clone(), eqpt);

    let control_handle = thread::Builder::new()
        .name("control-loop".into())
        .spawn(move || control_loop.run())
        .wrap_err("Failed to start the control loop thread")?;

    info!("Control loop thread started\n");

    // ---- OPERATOR CONSOLE ----

    if let Err(e) = run_console(&state_mgr, &console_log) {
        warn!("Operator console failed: {}", e);
    }

    // Make sure the loop sees OFF whatever ended the console
    state_mgr.stop();

    control_handle
        .join()
        .map_err(|_| eyre!("The control loop thread panicked"))?;

    info!("End of execution");

    session.exit();

    Ok(())
}

/// Read and execute operator commands until the operator stops the system.
fn run_console(state_mgr: &StateMgr, console_log: &ConsoleLog) -> Result<(), ReadlineError> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                match OperatorCmd::parse(&line) {
                    Ok(cmd) => {
                        rl.add_history_entry(line.as_str())?;

                        if exec_cmd(cmd, state_mgr, console_log) {
                            return Ok(());
                        }
                    }
                    Err(TcParseError::Empty) => (),
                    Err(e) => println!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                info!("Console closed, stopping");
                state_mgr.stop();
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}

/// Execute a single operator command, returns `true` if the system was stopped.
fn exec_cmd(cmd: OperatorCmd, state_mgr: &StateMgr, console_log: &ConsoleLog) -> bool {
    let accepted = match cmd {
        OperatorCmd::Standby => state_mgr.standby(),
        OperatorCmd::Calibrate => state_mgr.calibrate(),
        OperatorCmd::Ready => state_mgr.ready(),
        OperatorCmd::Active => state_mgr.active(),
        OperatorCmd::Deactivate => state_mgr.deactivate(),
        OperatorCmd::Stop => {
            state_mgr.stop();
            return true;
        }
        OperatorCmd::State => {
            println!("{}", state_mgr.get_state());
            return false;
        }
        OperatorCmd::Errors => {
            for entry in state_mgr.get_errors() {
                println!("{:10.3} {}", entry.timestamp_s, entry.msg);
            }
            return false;
        }
        OperatorCmd::Log => {
            for line in console_log.lines() {
                println!("{}", line);
            }
            return false;
        }
    };

    if !accepted {
        if let Some(target) = cmd.target_state() {
            println!(
                "Request for {} rejected while in {}",
                target,
                state_mgr.get_state()
            );
        }
    }

    false
}
