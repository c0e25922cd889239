mod input;
mod output;
mod provenance;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use normtree::prelude::*;
use output::{SearchReport, SurfaceRecord};
use provenance::Payload;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Normal and almost normal surface searches")]
struct Cmd {
    /// Log search internals (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    action: Action,
}

#[derive(Args, Clone)]
struct Source {
    /// Named example triangulation
    #[arg(long)]
    example: Option<String>,
    /// JSON gluing file
    #[arg(long)]
    input: Option<PathBuf>,
}

impl Source {
    fn label(&self) -> String {
        match (&self.example, &self.input) {
            (Some(name), _) => name.clone(),
            (None, Some(path)) => path.display().to_string(),
            (None, None) => String::new(),
        }
    }

    fn load(&self) -> Result<Triangulation> {
        input::load(self.example.as_deref(), self.input.as_deref())
    }
}

#[derive(Args, Clone)]
struct SearchArgs {
    #[command(flatten)]
    source: Source,
    #[arg(long, value_enum, default_value_t = CoordsArg::Standard)]
    coords: CoordsArg,
    #[arg(long, value_enum, default_value_t = ConstraintArg::None)]
    constraint: ConstraintArg,
    #[arg(long, value_enum, default_value_t = BanArg::None)]
    ban: BanArg,
    /// Cancel the search after this many seconds
    #[arg(long)]
    max_seconds: Option<f64>,
    /// Write JSON here (plus a provenance sidecar) instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Action {
    /// List every vertex surface
    Enumerate {
        #[command(flatten)]
        search: SearchArgs,
        /// Stop after this many surfaces
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Look for one non-trivial surface
    Find {
        #[command(flatten)]
        search: SearchArgs,
        #[arg(long, value_enum, default_value_t = BranchingArg::FewestFeasible)]
        branching: BranchingArg,
    },
    /// Print a small provenance JSON block
    Report,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CoordsArg {
    Standard,
    Quad,
    AlmostNormal,
    QuadOct,
}

impl From<CoordsArg> for NormalCoords {
    fn from(c: CoordsArg) -> Self {
        match c {
            CoordsArg::Standard => NormalCoords::Standard,
            CoordsArg::Quad => NormalCoords::Quad,
            CoordsArg::AlmostNormal => NormalCoords::AlmostNormal,
            CoordsArg::QuadOct => NormalCoords::QuadOct,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ConstraintArg {
    None,
    EulerPositive,
    EulerZero,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BanArg {
    None,
    Boundary,
    TorusBoundary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BranchingArg {
    FewestFeasible,
    ScanOrder,
}

impl From<BranchingArg> for Branching {
    fn from(b: BranchingArg) -> Self {
        match b {
            BranchingArg::FewestFeasible => Branching::FewestFeasible,
            BranchingArg::ScanOrder => Branching::ScanOrder,
        }
    }
}

/// A search generic over the constraint and ban policy, picked at runtime.
trait Job {
    fn run<C: LpConstraint, B: BanPolicy>(self) -> Result<SearchReport>;
}

fn dispatch<J: Job>(constraint: ConstraintArg, ban: BanArg, job: J) -> Result<SearchReport> {
    use BanArg as B;
    use ConstraintArg as C;
    match (constraint, ban) {
        (C::None, B::None) => job.run::<NoConstraint, BanNone>(),
        (C::None, B::Boundary) => job.run::<NoConstraint, BanBoundary>(),
        (C::None, B::TorusBoundary) => job.run::<NoConstraint, BanTorusBoundary>(),
        (C::EulerPositive, B::None) => job.run::<EulerPositive, BanNone>(),
        (C::EulerPositive, B::Boundary) => job.run::<EulerPositive, BanBoundary>(),
        (C::EulerPositive, B::TorusBoundary) => job.run::<EulerPositive, BanTorusBoundary>(),
        (C::EulerZero, B::None) => job.run::<EulerZero, BanNone>(),
        (C::EulerZero, B::Boundary) => job.run::<EulerZero, BanBoundary>(),
        (C::EulerZero, B::TorusBoundary) => job.run::<EulerZero, BanTorusBoundary>(),
    }
}

struct EnumerateJob {
    tri: Arc<Triangulation>,
    coords: NormalCoords,
    limit: Option<usize>,
    max_seconds: Option<f64>,
}

impl Job for EnumerateJob {
    fn run<C: LpConstraint, B: BanPolicy>(self) -> Result<SearchReport> {
        let mut e = TreeEnumeration::<C, B>::new(Arc::clone(&self.tri), self.coords)?;
        if e.constraints_broken() {
            tracing::warn!(constraint = C::NAME, "constraint ignored for this triangulation");
        }
        arm_timer(e.cancel_token(), self.max_seconds)?;

        let mut surfaces = Vec::new();
        let stopped = e.run(|e| {
            surfaces.push(SurfaceRecord::new(e.type_string(), &e.build_surface()));
            if surfaces.len() % 1000 == 0 {
                tracing::info!(found = surfaces.len(), percent = e.percent(), "progress");
            }
            self.limit.is_some_and(|n| surfaces.len() >= n)
        });
        tracing::info!(found = surfaces.len(), visited = e.visited(), "enumeration done");

        Ok(SearchReport {
            coords: self.coords.name(),
            constraint: C::NAME,
            ban: B::NAME,
            tetrahedra: self.tri.size(),
            visited: e.visited(),
            constraints_broken: e.constraints_broken(),
            complete: !stopped && !e.is_cancelled(),
            surfaces,
        })
    }
}

struct FindJob {
    tri: Arc<Triangulation>,
    coords: NormalCoords,
    cfg: SingleSolnCfg,
    max_seconds: Option<f64>,
}

impl Job for FindJob {
    fn run<C: LpConstraint, B: BanPolicy>(self) -> Result<SearchReport> {
        let mut s = TreeSingleSoln::<C, B>::with_cfg(Arc::clone(&self.tri), self.coords, self.cfg)?;
        arm_timer(s.cancel_token(), self.max_seconds)?;

        let found = s.find();
        tracing::info!(found, visited = s.visited(), "search done");
        let surfaces = if found {
            vec![SurfaceRecord::new(s.type_string(), &s.build_surface())]
        } else {
            Vec::new()
        };

        Ok(SearchReport {
            coords: self.coords.name(),
            constraint: C::NAME,
            ban: B::NAME,
            tetrahedra: self.tri.size(),
            visited: s.visited(),
            constraints_broken: s.constraints_broken(),
            complete: !s.is_cancelled(),
            surfaces,
        })
    }
}

/// Cancel through `token` once `max_seconds` have passed.
fn arm_timer(token: CancelToken, max_seconds: Option<f64>) -> Result<()> {
    let Some(secs) = max_seconds else {
        return Ok(());
    };
    let budget = Duration::try_from_secs_f64(secs).with_context(|| format!("--max-seconds {secs}"))?;
    std::thread::spawn(move || {
        std::thread::sleep(budget);
        token.cancel();
    });
    Ok(())
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = match cmd.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cmd.action {
        Action::Enumerate { search, limit } => enumerate(search, limit),
        Action::Find { search, branching } => find(search, branching),
        Action::Report => report(),
    }
}

fn enumerate(args: SearchArgs, limit: Option<usize>) -> Result<()> {
    let coords = NormalCoords::from(args.coords);
    tracing::info!(source = %args.source.label(), coords = %coords, constraint = ?args.constraint, ban = ?args.ban, ?limit, "enumerate");
    let job = EnumerateJob {
        tri: Arc::new(args.source.load()?),
        coords,
        limit,
        max_seconds: args.max_seconds,
    };
    let report = dispatch(args.constraint, args.ban, job)?;
    let params = serde_json::json!({
        "command": "enumerate",
        "coords": coords.name(),
        "constraint": report.constraint,
        "ban": report.ban,
        "limit": limit,
        "max_seconds": args.max_seconds,
    });
    emit(&report, args.out.as_deref(), &args.source, params)
}

fn find(args: SearchArgs, branching: BranchingArg) -> Result<()> {
    let coords = NormalCoords::from(args.coords);
    if !coords.stores_triangles() {
        bail!("find needs triangle coordinates (standard or almost-normal), got {coords}");
    }
    tracing::info!(source = %args.source.label(), coords = %coords, constraint = ?args.constraint, ban = ?args.ban, ?branching, "find");
    let job = FindJob {
        tri: Arc::new(args.source.load()?),
        coords,
        cfg: SingleSolnCfg {
            branching: branching.into(),
        },
        max_seconds: args.max_seconds,
    };
    let report = dispatch(args.constraint, args.ban, job)?;
    let params = serde_json::json!({
        "command": "find",
        "coords": coords.name(),
        "constraint": report.constraint,
        "ban": report.ban,
        "branching": format!("{branching:?}"),
        "max_seconds": args.max_seconds,
    });
    emit(&report, args.out.as_deref(), &args.source, params)
}

/// Print the report, or write it to `out` with a provenance sidecar.
fn emit(report: &SearchReport, out: Option<&Path>, source: &Source, params: serde_json::Value) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(report)?;
    let Some(out) = out else {
        println!("{}", String::from_utf8_lossy(&bytes));
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    std::fs::write(out, &bytes).with_context(|| format!("writing {}", out.display()))?;
    let sidecar = provenance::write_sidecar(out, Payload::new(source.label(), params))?;
    tracing::info!(out = %out.display(), sidecar = %sidecar.display(), surfaces = report.surfaces.len(), "wrote");
    Ok(())
}

fn report() -> Result<()> {
    let mut obj = provenance::base_doc();
    obj["examples"] = serde_json::json!(normtree::triangulation::special::NAMES);
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn example(name: &str) -> Arc<Triangulation> {
        Arc::new(special::by_name(name).unwrap())
    }

    #[test]
    fn cli_parses_search_flags() {
        let cmd = Cmd::try_parse_from([
            "cli",
            "enumerate",
            "--example",
            "lst-123",
            "--coords",
            "almost-normal",
            "--constraint",
            "euler-positive",
            "--limit",
            "3",
        ])
        .unwrap();
        let Action::Enumerate { search, limit } = cmd.action else {
            panic!("expected enumerate");
        };
        assert_eq!(search.coords, CoordsArg::AlmostNormal);
        assert_eq!(search.constraint, ConstraintArg::EulerPositive);
        assert_eq!(search.ban, BanArg::None);
        assert_eq!(limit, Some(3));
    }

    #[test]
    fn enumerate_job_counts_free_tet() {
        let job = EnumerateJob {
            tri: example("single-tet"),
            coords: NormalCoords::AlmostNormal,
            limit: None,
            max_seconds: None,
        };
        let report = dispatch(ConstraintArg::None, BanArg::None, job).unwrap();
        assert_eq!(report.surfaces.len(), 10);
        assert!(report.complete);
        assert_eq!(report.coords, NormalCoords::AlmostNormal.name());
    }

    #[test]
    fn enumerate_job_honours_limit() {
        let job = EnumerateJob {
            tri: example("single-tet"),
            coords: NormalCoords::Standard,
            limit: Some(2),
            max_seconds: None,
        };
        let report = dispatch(ConstraintArg::None, BanArg::None, job).unwrap();
        assert_eq!(report.surfaces.len(), 2);
        assert!(!report.complete);
    }

    #[test]
    fn unsupported_policy_is_an_error() {
        let job = EnumerateJob {
            tri: example("lst-123"),
            coords: NormalCoords::Quad,
            limit: None,
            max_seconds: None,
        };
        let err = dispatch(ConstraintArg::EulerZero, BanArg::None, job).unwrap_err();
        assert!(err.to_string().contains("euler-zero"));
    }

    #[test]
    fn find_writes_output_and_sidecar() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("find.json");
        let search = SearchArgs {
            source: Source {
                example: Some("lst-123".into()),
                input: None,
            },
            coords: CoordsArg::Standard,
            constraint: ConstraintArg::EulerPositive,
            ban: BanArg::None,
            max_seconds: None,
            out: Some(out.clone()),
        };
        find(search, BranchingArg::FewestFeasible).unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(doc["surfaces"].as_array().map(Vec::len), Some(1));
        assert_eq!(doc["surfaces"][0]["euler_char"], "1");
        assert_eq!(doc["constraint"], "euler-positive");
        assert!(dir.path().join("find.provenance.json").exists());
    }

    #[test]
    fn find_rejects_quad_coordinates() {
        let search = SearchArgs {
            source: Source {
                example: Some("lst-123".into()),
                input: None,
            },
            coords: CoordsArg::Quad,
            constraint: ConstraintArg::None,
            ban: BanArg::None,
            max_seconds: None,
            out: None,
        };
        assert!(find(search, BranchingArg::ScanOrder).is_err());
    }
}
