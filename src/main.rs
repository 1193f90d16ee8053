// src/main.rs
mod cli;

use anyhow::Result;
use cdsdb::model::ObjectId;
use cdsdb::CdsDatabase;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    env_logger::init();

    let cli = cli::Cli::parse();

    let xdg_dirs = xdg::BaseDirectories::with_prefix("cdsdb")?;
    let db_path = match cli.db_path {
        Some(p) => p,
        None => xdg_dirs.place_data_file("cds.sqlite")?,
    };
    info!("Using database: {}", db_path.display());

    let resource_attributes = vec!["mimetype".to_string(), "resolution".to_string(), "duration".to_string()];
    let db = CdsDatabase::open_at(&db_path, &resource_attributes, true)?;

    match cli.command {
        cli::Command::Ls { parent_id } => {
            for obj in db.get_objects(ObjectId::Persistent(parent_id), false)? {
                println!("{}\t{}\t{}", obj.id(), obj.header().upnp_class, obj.header().title);
            }
        }
        cli::Command::Mkdir { path, upnp_class } => {
            let id = db.add_container_chain(&path, &upnp_class, false)?;
            println!("{id}");
        }
        cli::Command::Meta { object_id } => {
            for (key, value) in db.retrieve_metadata_for_object(object_id)? {
                println!("{key}={value}");
            }
        }
        cli::Command::Rm { object_id, all } => {
            let changed = db.remove_object(ObjectId::Persistent(object_id), all)?;
            info!("updated {} containers, purged {}", changed.upnp_update_ids.len(), changed.purged.len());
        }
        cli::Command::Stat => {
            println!("total files: {}", db.get_total_files(None, None, None)?);
        }
    }

    Ok(())
}
