use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Args, Parser, Subcommand};
use ctpa_viewer::{
    Plane, SortBy, ViewState, VolumeLoader, WindowPreset,
    api::{ApiClient, RetryPolicy},
    config::{Config, DEFAULT_API_URL},
    viewer::Viewer,
    window::{CENTER_RANGE, WIDTH_RANGE},
};
use log::info;

#[derive(Debug, clap::ValueEnum, Clone, Copy)]
enum ArgSortBy {
    ImagePosition,
    TablePosition,
    InstanceNumber,
    FileName,
}

impl From<ArgSortBy> for SortBy {
    fn from(value: ArgSortBy) -> Self {
        match value {
            ArgSortBy::ImagePosition => SortBy::ImagePositionPatient,
            ArgSortBy::TablePosition => SortBy::TablePosition,
            ArgSortBy::InstanceNumber => SortBy::InstanceNumber,
            ArgSortBy::FileName => SortBy::None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "CT pulmonary angiography viewer")]
struct Cli {
    /// Base URL of the analysis backend
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,
    /// Timeout in seconds for lightweight requests
    #[arg(long, env = "CTPA_REQUEST_TIMEOUT", default_value_t = 30, global = true)]
    timeout: u64,
    /// Timeout in seconds for uploads and report generation
    #[arg(long, env = "CTPA_REPORT_TIMEOUT", default_value_t = 60, global = true)]
    report_timeout: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ViewArgs {
    #[arg(long, default_value = "axial")]
    plane: Plane,
    /// Slice index; defaults to the middle of the plane
    #[arg(long)]
    index: Option<usize>,
    /// pulmonary, mediastinal, bone or pe-protocol
    #[arg(long)]
    preset: Option<WindowPreset>,
    /// Window center in HU, overrides the preset
    #[arg(
        long,
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(i32).range(i64::from(CENTER_RANGE.0)..=i64::from(CENTER_RANGE.1))
    )]
    center: Option<i32>,
    /// Window width in HU, overrides the preset
    #[arg(
        long,
        value_parser = clap::value_parser!(i32).range(i64::from(WIDTH_RANGE.0)..=i64::from(WIDTH_RANGE.1))
    )]
    width: Option<i32>,
}

impl ViewArgs {
    fn apply(
        &self,
        view: ViewState,
        dims: (usize, usize, usize),
    ) -> Result<ViewState, Box<dyn Error + Sync + Send>> {
        let mut view = view.switch_plane(self.plane, dims);
        if let Some(index) = self.index {
            view = view.set_slice(index, dims);
        }
        if let Some(preset) = self.preset {
            view = view.apply_preset(preset);
        }
        if self.center.is_some() || self.width.is_some() {
            let center = self.center.unwrap_or(view.window().center());
            let width = self.width.unwrap_or(view.window().width());
            view = view.set_window(center, width)?;
        }
        Ok(view)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check backend and model status
    Health,
    /// List scans known to the backend
    List,
    /// Upload a NIfTI or NumPy scan
    Upload { path: PathBuf },
    /// Show scan metadata
    Info { scan_id: String },
    /// Fetch a windowed slice from the backend
    Slice {
        scan_id: String,
        #[command(flatten)]
        view: ViewArgs,
        #[arg(short, long, default_value = "slice.png")]
        output: PathBuf,
    },
    /// Ask a question about a scan
    Ask {
        scan_id: String,
        question: String,
        /// Answer from a saved report instead of the backend
        #[arg(long)]
        offline: bool,
        /// Report HTML used by --offline
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Generate the analysis report for a scan
    Report {
        scan_id: String,
        #[arg(short, long, default_value = "report.html")]
        output: PathBuf,
    },
    /// Window a slice of a local NIfTI file or DICOM directory
    Render {
        input: PathBuf,
        #[command(flatten)]
        view: ViewArgs,
        /// Slice order of a DICOM directory
        #[arg(long, value_enum, default_value = "image-position")]
        sort: ArgSortBy,
        #[arg(short, long, default_value = "slice.png")]
        output: PathBuf,
    },
}

fn print_notifications(viewer: &mut Viewer) {
    for notification in viewer.session_mut().take_notifications() {
        eprintln!("{notification}");
    }
}

fn render_local(
    input: &Path,
    view: &ViewArgs,
    sort: SortBy,
    output: &Path,
) -> Result<(), Box<dyn Error + Sync + Send>> {
    let volume = VolumeLoader::load_from_path(input, sort)?;
    let dims = volume.dim();
    let state = view.apply(ViewState::new(dims)?, dims)?;
    let image = volume.get_image_from_axis(state.current_slice(), state.plane(), state.window())?;
    image.save(output)?;
    info!(
        "Saved {} slice {} with window {}/{} to {}",
        state.plane(),
        state.current_slice(),
        state.window().center(),
        state.window().width(),
        output.display()
    );
    Ok(())
}

async fn execute(viewer: &mut Viewer, command: Command) -> Result<(), Box<dyn Error + Sync + Send>> {
    match command {
        Command::Health => {
            let health = viewer.health().await;
            println!(
                "status: {}, model loaded: {}",
                health.status, health.model_loaded
            );
        }
        Command::List => {
            let scans = viewer.list_scans().await;
            if scans.is_empty() {
                println!("No CTPA scans available yet");
            }
            for scan in scans {
                println!("{}\t{}\t{}", scan.scan_id, scan.filename, scan.upload_date());
            }
        }
        Command::Upload { path } => {
            let uploaded = viewer.upload(&path).await?;
            println!("{}\t{}", uploaded.scan_id, uploaded.filename);
        }
        Command::Info { scan_id } => {
            let view = viewer.open_scan(&scan_id).await?;
            if let Some((x, y, z)) = viewer.session().dims() {
                println!("dimensions: {x} x {y} x {z}");
            }
            println!("default axial slice: {}", view.current_slice());
        }
        Command::Slice {
            scan_id,
            view,
            output,
        } => {
            let state = viewer.open_scan(&scan_id).await?;
            let session = viewer.session_mut();
            if let Some(dims) = session.dims() {
                let state = view.apply(state, dims)?;
                session.update_view(|_, _| state);
            }
            let bytes = viewer.fetch_current_slice().await?;
            fs::write(&output, bytes)?;
            info!("Saved slice to {}", output.display());
        }
        Command::Ask {
            scan_id,
            question,
            offline: true,
            report,
        } => {
            if let Some(report) = report {
                let html = fs::read_to_string(report)?;
                viewer.session_mut().store_report(scan_id.as_str(), html);
            }
            println!("{}", viewer.ask_offline(&scan_id, &question));
        }
        Command::Ask {
            scan_id, question, ..
        } => {
            viewer.open_scan(&scan_id).await?;
            println!("{}", viewer.ask(&question).await?);
        }
        Command::Report { scan_id, output } => {
            viewer.open_scan(&scan_id).await?;
            let html = viewer.generate_report().await?;
            fs::write(&output, html)?;
            info!("Saved report to {}", output.display());
        }
        Command::Render {
            input,
            view,
            sort,
            output,
        } => render_local(&input, &view, sort.into(), &output)?,
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error + Sync + Send>> {
    let config = Config {
        api_url: cli.api_url,
        request_timeout: Duration::from_secs(cli.timeout),
        long_request_timeout: Duration::from_secs(cli.report_timeout),
        report_retry: RetryPolicy::default(),
    };
    let mut viewer = Viewer::new(ApiClient::new(&config)?);

    let result = execute(&mut viewer, cli.command).await;
    print_notifications(&mut viewer);
    result
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Sync + Send>> {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    run(Cli::parse()).await
}
