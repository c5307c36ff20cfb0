use crate::assemble::{Assembler, parse_range, span_len};
use crate::db::Db;
use crate::model::{Counts, DiagramPayload, Outcome, Response};
use crate::request::{Mode, Request};
use crate::schema::SchemaProfile;
use crate::{coords, stats};
use anyhow::Result;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// One request against one job store. Owns the store handle, and with it the
/// query cache and audit log, for the lifetime of the request.
pub struct Engine {
    db: Db,
    request: Request,
    profile: SchemaProfile,
}

impl Engine {
    pub fn open(db_path: &Path, request: Request, audit_path: Option<&Path>) -> Result<Self> {
        let mut db = Db::open(db_path, audit_path)?;
        let profile = SchemaProfile::resolve(&mut db, &request.id_type)?;
        Ok(Self {
            db,
            request,
            profile,
        })
    }

    pub fn profile(&self) -> SchemaProfile {
        self.profile
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn run(&mut self) -> Result<Outcome> {
        match &self.request.mode {
            Mode::Stats { query } => {
                let stats = stats::summarize(&mut self.db, self.profile, &self.request, query)?;
                Ok(Outcome::Stats(stats))
            }
            Mode::Diagrams { range } => {
                let (lo, hi) = parse_range(range)?;
                Ok(Outcome::Diagrams(self.diagrams(lo, hi)?))
            }
        }
    }

    fn diagrams(&mut self, lo: i64, hi: i64) -> Result<DiagramPayload> {
        let requested = span_len(lo, hi)?;
        coords::check_scale_factor(self.request.scale_factor)?;
        let mut assembler = Assembler::new(&mut self.db, self.profile, &self.request)?;
        let mut data = assembler.assemble(lo, hi)?;
        let bounds = coords::transform(&mut data, self.request.scale_factor)?;
        Ok(DiagramPayload {
            time: format!("#Q={requested} TQ=0 #N={requested} TN=0 PROC=0 PARSE=0 Total=0"),
            counts: Counts {
                max: requested,
                invalid: Vec::new(),
                displayed: 0,
            },
            data,
            bounds,
        })
    }
}

/// Run `request` against the store at `db_path` and always produce an envelope.
pub fn render(db_path: &Path, request: Request, audit_path: Option<&Path>) -> Response {
    let started = Instant::now();
    let mode = match request.mode {
        Mode::Stats { .. } => "stats",
        Mode::Diagrams { .. } => "diagrams",
    };
    let result = Engine::open(db_path, request, audit_path).and_then(|mut engine| {
        let outcome = engine.run();
        info!(
            db = %db_path.display(),
            mode,
            profile = engine.profile().name(),
            round_trips = engine.db().store_round_trips(),
            elapsed = ?started.elapsed(),
            "request finished"
        );
        outcome
    });
    if let Err(err) = &result {
        warn!(db = %db_path.display(), mode, error = %format!("{err:#}"), "request failed");
    }
    Response::from_result(result, started.elapsed())
}

pub fn render_json(db_path: &Path, request: Request, audit_path: Option<&Path>) -> Result<String> {
    Ok(render(db_path, request, audit_path).to_json()?)
}
