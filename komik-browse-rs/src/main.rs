use komik_core::{
    format_grace_period,
    format_modified,
    print_size,
    sanitize_user_path,
    BrowsePhase,
    BrowseState,
    BrowserConfig,
    BrowserViewModel,
    CoreError,
    Preferences,
    RealFileSystem,
};
use std::env;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Default)]
struct CliConfig {
    config_file: Option<PathBuf>,
    prefs_file: Option<PathBuf>,
    start_dir: Option<PathBuf>,
}

#[derive(Debug)]
enum CliError {
    Help,
    Version,
    Usage(String),
    Core(CoreError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => write!(f, "help"),
            Self::Version => write!(f, "version"),
            Self::Usage(message) => write!(f, "{}", message),
            Self::Core(err) => write!(f, "{}", err),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

fn print_help(prog: &str) {
    println!(
        "\
usage: {prog} [-h] [--version] [--config FILE] [--prefs FILE] [DIR]

Browse a comic library. Deleted comics can be restored with `undo`
until the grace period is over.

options:
  -h, --help            show this help message and exit
  --version             show program's version number and exit
  --config FILE         read settings from a TOML file
  --prefs FILE          remember the session in FILE
",
        prog = prog
    );
}

fn print_commands() {
    println!(
        "\
commands:
  ls                    list the current directory
  cd DIR                open a sub-directory, `..` or an absolute path
  rm NAME...            delete entries (undoable during the grace period)
  undo                  restore the entries deleted last
  open NAME [PAGE]      remember NAME as the comic being read
  pwd                   print the current directory
  help                  show this text
  quit                  delete pending entries and exit"
    );
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<PathBuf, CliError> {
    if *i + 1 >= args.len() {
        return Err(CliError::Usage(format!("missing value for {}", flag)));
    }
    *i += 1;
    Ok(PathBuf::from(&args[*i]))
}

fn parse_args(args: &[String]) -> Result<CliConfig, CliError> {
    let mut config = CliConfig::default();

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--help" | "-h" => return Err(CliError::Help),
            "--version" => return Err(CliError::Version),
            "--config" => config.config_file = Some(take_value(args, &mut i, "--config")?),
            "--prefs" => config.prefs_file = Some(take_value(args, &mut i, "--prefs")?),
            _ if arg.starts_with("--config=") => {
                config.config_file = Some(PathBuf::from(&arg["--config=".len()..]));
            }
            _ if arg.starts_with("--prefs=") => {
                config.prefs_file = Some(PathBuf::from(&arg["--prefs=".len()..]));
            }
            _ if arg.starts_with('-') => {
                return Err(CliError::Usage(format!("unrecognized arguments: {}", arg)));
            }
            _ if config.start_dir.is_none() => config.start_dir = Some(PathBuf::from(arg)),
            _ => {
                return Err(CliError::Usage(format!("unrecognized arguments: {}", arg)));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn default_prefs_file() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join("komik").join("prefs.toml"));
    }
    env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("komik")
            .join("prefs.toml")
    })
}

fn load_settings(cli: &CliConfig) -> Result<BrowserConfig, CliError> {
    let config = match &cli.config_file {
        Some(path) => BrowserConfig::load(&RealFileSystem, path)?,
        None => BrowserConfig::default(),
    };
    Ok(config.apply_env_overrides()?)
}

fn open_preferences(cli: &CliConfig, config: &BrowserConfig) -> Result<Preferences, CliError> {
    let path = cli
        .prefs_file
        .clone()
        .or_else(|| config.preferences_file.clone())
        .or_else(default_prefs_file);
    match path {
        Some(path) => Ok(Preferences::open(Arc::new(RealFileSystem), path)?),
        None => {
            log::warn!("no HOME or XDG_CONFIG_HOME, the session will not be remembered");
            Ok(Preferences::uninitialized())
        }
    }
}

fn start_dir(cli: &CliConfig, state: &BrowseState) -> PathBuf {
    if let Some(dir) = &cli.start_dir {
        return dir.clone();
    }
    if let BrowsePhase::Uninitialized(session) = &state.phase {
        if !session.root_dir.is_empty() {
            return PathBuf::from(&session.root_dir);
        }
    }
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn print_state(state: &BrowseState) {
    match &state.phase {
        BrowsePhase::Ready { dir, entries } => {
            println!("{}", sanitize_user_path(dir));
            if entries.is_empty() {
                println!("  (no comics)");
            }
            for entry in entries {
                let size = entry.size_bytes.map(print_size).unwrap_or_default();
                let modified = entry.modified.as_ref().map(format_modified).unwrap_or_default();
                println!("  {:<4} {:>8}  {:<16}  {}", entry.kind.as_str(), size, modified, entry.name);
            }
        }
        BrowsePhase::Error { message } => eprintln!("komik-browse: {}", message),
        BrowsePhase::Loading { dir } => println!("loading {}", sanitize_user_path(dir)),
        BrowsePhase::Uninitialized(_) => println!("no directory opened"),
    }
}

/// Resolves names typed by the user against the listed entries.
fn resolve(state: &BrowseState, names: &[&str]) -> Result<Vec<PathBuf>, String> {
    let entries = state.entries().unwrap_or_default();
    names
        .iter()
        .map(|name| {
            entries
                .iter()
                .find(|e| e.name == *name)
                .map(|e| e.path.clone())
                .ok_or_else(|| format!("no such entry: {}", name))
        })
        .collect()
}

fn handle_cd(model: &mut BrowserViewModel, target: &str) {
    let current = model.browser().current_dir().map(Path::to_path_buf);
    let next = match (target, current) {
        ("..", Some(dir)) => dir.parent().map(Path::to_path_buf).unwrap_or(dir),
        (target, Some(dir)) if !Path::new(target).is_absolute() => dir.join(target),
        (target, _) => absolute(PathBuf::from(target)),
    };
    model.load_comics(&next);
    let state = model.state();
    if state.is_ready() {
        model.set_pref_root_dir(&next);
    }
    print_state(&state);
}

fn handle_rm(model: &mut BrowserViewModel, names: &[&str]) {
    if names.is_empty() {
        eprintln!("komik-browse: rm needs at least one name");
        return;
    }
    let paths = match resolve(&model.state(), names) {
        Ok(paths) => paths,
        Err(message) => {
            eprintln!("komik-browse: {}", message);
            return;
        }
    };
    let count = paths.len();
    let forced = match model.prepare_delete_files(paths) {
        Ok(forced) => forced,
        Err(err) => {
            eprintln!("komik-browse: {}", err);
            return;
        }
    };
    for failed in &forced.failed {
        eprintln!("komik-browse: could not delete {}", sanitize_user_path(failed));
    }
    println!(
        "{} item(s) deleted, `undo` within {} to restore",
        count,
        format_grace_period(model.deletion().grace_period())
    );
}

fn handle_open(model: &mut BrowserViewModel, args: &[&str]) {
    let Some((name, rest)) = args.split_first() else {
        eprintln!("komik-browse: open needs a name");
        return;
    };
    let path = match resolve(&model.state(), &[*name]) {
        Ok(mut paths) => paths.remove(0),
        Err(message) => {
            eprintln!("komik-browse: {}", message);
            return;
        }
    };
    let page = match rest.first().map(|p| p.parse::<u32>()) {
        Some(Ok(page)) => page,
        Some(Err(_)) => {
            eprintln!("komik-browse: page must be a number");
            return;
        }
        None => 0,
    };
    model.set_pref_last_comic_path(&path);
    model.set_pref_current_page(page);
    println!("reading {} at page {}", sanitize_user_path(&path), page);
}

/// Returns false when the loop should stop.
fn dispatch(model: &mut BrowserViewModel, line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((command, args)) = words.split_first() else {
        return true;
    };
    match *command {
        "ls" => {
            model.refresh();
            print_state(&model.state());
        }
        "cd" => match args.first() {
            Some(target) => handle_cd(model, target),
            None => eprintln!("komik-browse: cd needs a directory"),
        },
        "rm" => handle_rm(model, args),
        "undo" => {
            if model.undo_delete_files() {
                model.refresh();
                println!("restored");
                print_state(&model.state());
            } else {
                println!("nothing to undo");
            }
        }
        "open" => handle_open(model, args),
        "pwd" => match model.browser().current_dir() {
            Some(dir) => println!("{}", sanitize_user_path(dir)),
            None => println!("no directory opened"),
        },
        "help" | "?" => print_commands(),
        "quit" | "exit" => return false,
        other => eprintln!("komik-browse: unknown command: {} (try `help`)", other),
    }
    true
}

async fn run(cli: CliConfig) -> Result<(), CliError> {
    let config = load_settings(&cli)?;
    let prefs = Arc::new(open_preferences(&cli, &config)?);
    let mut model = BrowserViewModel::open(&config, prefs);

    model.init();
    let dir = absolute(start_dir(&cli, &model.state()));
    model.load_comics(&dir);
    let state = model.state();
    if state.is_ready() {
        model.set_pref_root_dir(&dir);
    }
    print_state(&state);

    let mut flushes = model.deletion().subscribe_flushes();
    let reporter = tokio::spawn(async move {
        while flushes.changed().await.is_ok() {
            log::info!("pending deletion committed");
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                eprintln!("komik-browse: cannot read input: {}", err);
                break;
            }
        };
        if !dispatch(&mut model, line.trim()) {
            break;
        }
    }

    let report = model.flush_pending_deletion();
    for failed in &report.failed {
        eprintln!("komik-browse: could not delete {}", sanitize_user_path(failed));
    }
    reporter.abort();
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let prog = args
        .first()
        .and_then(|p| Path::new(p).file_name())
        .and_then(|p| p.to_str())
        .unwrap_or("komik-browse")
        .to_string();

    let result = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(cli) => run(cli).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => {}
        Err(CliError::Help) => print_help(&prog),
        Err(CliError::Version) => println!("{} {}", prog, VERSION),
        Err(CliError::Usage(message)) => {
            eprintln!("{}: error: {}", prog, message);
            exit(2);
        }
        Err(CliError::Core(err)) => {
            eprintln!("{}: {}", prog, err);
            exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use komik_core::Entry;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_start_dir() {
        let cli = parse_args(&args(&["--prefs", "/tmp/p.toml", "--config=/tmp/c.toml", "/comics"]))
            .unwrap();
        assert_eq!(cli.prefs_file, Some(PathBuf::from("/tmp/p.toml")));
        assert_eq!(cli.config_file, Some(PathBuf::from("/tmp/c.toml")));
        assert_eq!(cli.start_dir, Some(PathBuf::from("/comics")));
    }

    #[test]
    fn rejects_unknown_and_incomplete_flags() {
        assert!(matches!(parse_args(&args(&["--nope"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(&args(&["--prefs"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(&args(&["a", "b"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(&args(&["-h"])), Err(CliError::Help)));
    }

    #[test]
    fn resolve_reports_unknown_names() {
        let state = BrowseState::ready(
            PathBuf::from("/comics"),
            vec![Entry::file("/comics/a.cbz")],
        );
        assert_eq!(resolve(&state, &["a.cbz"]).unwrap(), vec![PathBuf::from("/comics/a.cbz")]);
        assert!(resolve(&state, &["b.cbz"]).is_err());
    }

    #[test]
    fn rm_outside_runtime_reports_and_keeps_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let comic = tmp.path().join("a.cbz");
        std::fs::write(&comic, b"zip").unwrap();
        let mut model =
            BrowserViewModel::open(&BrowserConfig::default(), Arc::new(Preferences::uninitialized()));
        model.load_comics(tmp.path());

        handle_rm(&mut model, &["a.cbz"]);

        assert!(comic.exists());
        assert!(!model.deletion().is_pending());
        assert_eq!(model.state().entries().map(|e| e.len()), Some(1));
    }

    #[test]
    fn missing_config_file_is_a_core_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cli = CliConfig {
            config_file: Some(tmp.path().join("absent.toml")),
            ..CliConfig::default()
        };
        assert!(matches!(load_settings(&cli), Err(CliError::Core(_))));
    }
}
