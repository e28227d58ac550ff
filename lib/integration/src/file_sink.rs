//! Order records on disk.
//!
//! The workshop picks up one small text file per customized case. Name
//! cases and photo cases go to separate directories, and each file is named
//! after the engraved name or theme plus the order id. Repeated names in
//! one order get a `_2`, `_3`, ... suffix so no record is overwritten.

use posh_support_conversation::{Customization, NameItem, OrderSink, OrderSinkError, PhotoItem};
use posh_support_core::OrderId;
use rootcause::prelude::Report;
use serde::Deserialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Characters removed from file stems.
const FORBIDDEN_CHARS: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Stem used when nothing is left of a name or theme.
const PLACEHOLDER_STEM: &str = "sem_titulo";

/// Records sharing one stem within a single order.
const MAX_RECORDS_PER_STEM: usize = 1000;

/// Where order records are written.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDirs {
    #[serde(default = "default_name_dir")]
    pub name_dir: PathBuf,
    #[serde(default = "default_photo_dir")]
    pub photo_dir: PathBuf,
}

fn default_name_dir() -> PathBuf {
    PathBuf::from("Nomes_Personalizar")
}

fn default_photo_dir() -> PathBuf {
    PathBuf::from("Fotos_Personalizar")
}

impl Default for OrderDirs {
    fn default() -> Self {
        Self {
            name_dir: default_name_dir(),
            photo_dir: default_photo_dir(),
        }
    }
}

/// [`OrderSink`] writing one text file per item.
#[derive(Debug, Clone)]
pub struct FileOrderSink {
    dirs: OrderDirs,
}

impl FileOrderSink {
    #[must_use]
    pub fn new(dirs: OrderDirs) -> Self {
        Self { dirs }
    }

    /// Preferred path of the record for `item`. Numbered variants are used
    /// when the file already exists.
    fn record_path(&self, order_id: &OrderId, item: &Customization) -> PathBuf {
        self.numbered_path(order_id, item, 1)
    }

    fn numbered_path(&self, order_id: &OrderId, item: &Customization, n: usize) -> PathBuf {
        let (dir, stem) = match item {
            Customization::Name(NameItem { engraved_name, .. }) => {
                (&self.dirs.name_dir, engraved_name)
            }
            Customization::Photo(PhotoItem { theme, .. }) => (&self.dirs.photo_dir, theme),
        };
        let mut stem = sanitize(stem);
        if stem.trim().is_empty() {
            stem = PLACEHOLDER_STEM.to_string();
        }
        if n == 1 {
            dir.join(format!("{stem}_{order_id}.txt"))
        } else {
            dir.join(format!("{stem}_{order_id}_{n}.txt"))
        }
    }
}

impl OrderSink for FileOrderSink {
    fn record(
        &self,
        order_id: &OrderId,
        item: &Customization,
    ) -> Result<(), Report<OrderSinkError>> {
        let first = self.record_path(order_id, item);
        if let Some(dir) = first.parent() {
            create_dir(dir)?;
        }

        for n in 1..=MAX_RECORDS_PER_STEM {
            let path = self.numbered_path(order_id, item, n);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(OrderSinkError::StorageFailed {
                        reason: format!("creating {}: {e}", path.display()),
                    }
                    .into());
                }
            };
            file.write_all(render(order_id, item).as_bytes())
                .map_err(|e| OrderSinkError::StorageFailed {
                    reason: format!("writing {}: {e}", path.display()),
                })?;
            info!(order_id = %order_id, path = %path.display(), "order record written");
            return Ok(());
        }

        Err(OrderSinkError::StorageFailed {
            reason: format!("no free record name after {}", first.display()),
        }
        .into())
    }
}

fn create_dir(dir: &Path) -> Result<(), Report<OrderSinkError>> {
    fs::create_dir_all(dir).map_err(|e| {
        OrderSinkError::StorageFailed {
            reason: format!("creating {}: {e}", dir.display()),
        }
        .into()
    })
}

fn sanitize(stem: &str) -> String {
    stem.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect()
}

fn render(order_id: &OrderId, item: &Customization) -> String {
    match item {
        Customization::Name(item) => format!(
            "ID_Pedido: {order_id}\nNome Gravado: {}\nModelo do Celular: {}\n",
            item.engraved_name, item.model
        ),
        Customization::Photo(item) => format!(
            "ID_Pedido: {order_id}\nModelo/Tema: {}\nNome do Arquivo da Foto: {}\n",
            item.theme, item.photo_filename
        ),
    }
}
