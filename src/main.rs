use clap::CommandFactory;
use netlock::{
    cli::{Action, Args, PolicyLoader},
    error::NetlockError,
    firewall::{EffectiveUser, LockController, Pfctl},
    net::SystemDnsResolver,
};

#[tokio::main]
async fn main() {
    let args = Args::parse_ordered();
    init_logger(args.verbose);

    if let Err(err) = run(&args).await {
        if matches!(err, NetlockError::Usage(_)) {
            let _ = Args::command().print_help();
            eprintln!();
        }
        log::debug!("{err:?}");
        eprintln!("netlock: {err}");
        std::process::exit(err.exit_code());
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run(args: &Args) -> Result<(), NetlockError> {
    let action = args.action()?;
    let controller = LockController::new(Pfctl, EffectiveUser);

    if action == Action::Status {
        let report = controller.report().await?;
        log::debug!("Lock state: {:?}", report.state);
        if !report.is_enabled() {
            println!("firewall: disabled");
            return Err(NetlockError::EngineDisabled);
        }
        println!("firewall: enabled");
        if let Some(rules) = report.rules {
            print!("{rules}");
        }
        return Ok(());
    }

    let policy = PolicyLoader::load(args, action, SystemDnsResolver::new).await?;

    if action.prints_rules() {
        print!("{}", controller.build_lock_rules(&policy));
    }

    match action {
        Action::Enable { .. } => {
            controller.enable_lock(&policy).await?;
            println!("OK");
        }
        Action::Disable { .. } => {
            controller.disable_lock(&policy).await?;
            println!("OK");
        }
        Action::Print | Action::Status => {}
    }

    Ok(())
}
