use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::Result;
use crate::api::Session;
use crate::config;
use crate::core::{LensId, ParamMap};
use crate::lens::LensRegistry;
use crate::snapshot::{self, SnapshotError};

use super::render;

pub fn inspect(file: &Path, json: bool) -> Result<()> {
    let text = fs::read_to_string(file)?;
    let state = snapshot::import_json(&text).map_err(crate::Error::from)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&state).map_err(encode)?);
    } else {
        render::state_summary(&state);
    }
    Ok(())
}

pub fn migrate(file: &Path, out: Option<&Path>) -> Result<()> {
    let text = fs::read_to_string(file)?;
    let doc: Value =
        serde_json::from_str(&text).map_err(|e| crate::Error::from(SnapshotError::Parse(e)))?;
    let migrated = snapshot::migrate_to_current(doc).map_err(SnapshotError::from)
        .map_err(crate::Error::from)?;
    let rendered = serde_json::to_string_pretty(&migrated).map_err(encode)?;
    match out {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

pub fn recompute(file: &Path, json: bool) -> Result<()> {
    let text = fs::read_to_string(file)?;
    let mut session = session_from_config()?;
    session.import(&text)?;
    report(&session, json)
}

pub fn export(file: &Path, out: Option<&Path>) -> Result<()> {
    let text = fs::read_to_string(file)?;
    let state = snapshot::import_json(&text).map_err(crate::Error::from)?;
    let rendered = snapshot::export_json(&state, crate::core::WallClock::now())
        .map_err(crate::Error::from)?;
    match out {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{rendered}"),
    }
    Ok(())
}

pub fn demo(save: bool, out: Option<&Path>, json: bool) -> Result<()> {
    let mut session = session_from_config()?;

    let melody = session.add_lane("melody");
    session.place_lens(
        &melody,
        0,
        &LensId::parse("ladder").expect("valid lens id"),
        ParamMap::new(),
    )?;
    let mut offset_params = ParamMap::new();
    offset_params.insert("amount".into(), serde_json::json!(12.0));
    session.place_lens(
        &melody,
        1,
        &LensId::parse("offset").expect("valid lens id"),
        offset_params,
    )?;

    let rhythm = session.add_lane("rhythm");
    let mut pulse_params = ParamMap::new();
    pulse_params.insert("steps".into(), serde_json::json!(16));
    session.place_lens(
        &rhythm,
        0,
        &LensId::parse("pulse").expect("valid lens id"),
        pulse_params,
    )?;
    let mut spread_params = ParamMap::new();
    spread_params.insert("factor".into(), serde_json::json!(0.5));
    session.place_lens(
        &rhythm,
        1,
        &LensId::parse("spread").expect("valid lens id"),
        spread_params,
    )?;

    if save {
        let path = out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| crate::paths::data_dir().join("demo.json"));
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let exported = session.export()?;
        fs::write(&path, exported)?;
        tracing::info!("snapshot saved to {}", path.display());
    }
    report(&session, json)
}

fn session_from_config() -> Result<Session> {
    let config = config::load_or_init();
    let mut session = Session::new(LensRegistry::with_builtins(), config.limits)?;
    session.set_row_count(config.row_count);
    Ok(session)
}

fn report(session: &Session, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(session.derived()).map_err(encode)?
        );
    } else {
        render::pass_report(session.state(), session.derived());
    }
    Ok(())
}

fn encode(e: serde_json::Error) -> crate::Error {
    crate::Error::from(SnapshotError::Encode(e))
}
