//! Drives every sheet of a manifest against a workbook.

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;
use tabulon_common::Table;
use tabulon_core::{BuildContext, Document, Locale, ReferCache, SheetParser, merge_document};
use tabulon_spec::{Schema, SheetDescriptor};
use tabulon_workbook::{Workbook, WorkbookSpaces};

use crate::error::CompileError;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Build sheets on the rayon pool.
    pub parallel: bool,
    /// Locale for sheets whose time zone cannot be read as a fixed offset.
    pub locale: Locale,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            locale: Locale::utc(),
        }
    }
}

/// Outcome of one sheet in a batch.
#[derive(Debug)]
pub struct SheetOutcome {
    pub sheet: String,
    pub result: Result<Document, CompileError>,
}

/// Compiles sheets of one workbook. All builds share a single value-space
/// cache, so each referenced column is scanned once per compiler.
pub struct Compiler {
    schema: Arc<Schema>,
    workbook: Arc<Workbook>,
    ctx: BuildContext,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(schema: Arc<Schema>, workbook: Arc<Workbook>, options: CompileOptions) -> Self {
        let spaces = WorkbookSpaces::new(workbook.clone(), schema.clone());
        let cache = Arc::new(ReferCache::new(Arc::new(spaces)));
        let ctx = BuildContext::new(options.locale).with_refer(cache);
        Self {
            schema,
            workbook,
            ctx,
            options,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Sheets compiled on their own: every declared sheet that is not
    /// merged or patched into another one.
    pub fn entry_sheets(&self) -> Vec<&SheetDescriptor> {
        let absorbed: BTreeSet<&str> = self
            .schema
            .sheets
            .iter()
            .flat_map(|s| s.merger.iter().chain(s.patches.iter()))
            .map(String::as_str)
            .collect();
        self.schema
            .sheets
            .iter()
            .filter(|s| !absorbed.contains(s.sheet.as_str()))
            .map(|s| s.as_ref())
            .collect()
    }

    /// Build one declared sheet, then its merger tables, then apply its
    /// patch sheets in order.
    pub fn compile_sheet(&self, name: &str) -> Result<Document, CompileError> {
        let desc = self
            .schema
            .sheet(name)
            .ok_or_else(|| CompileError::UndeclaredSheet(name.to_string()))?;
        self.compile(desc)
    }

    fn compile(&self, desc: &SheetDescriptor) -> Result<Document, CompileError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("compile_sheet", sheet = %desc.sheet).entered();

        let main = self.workbook.require(&desc.sheet)?;
        let mut mergers: Vec<&dyn Table> = Vec::with_capacity(desc.merger.len());
        for name in &desc.merger {
            mergers.push(self.workbook.require(name)?.as_ref());
        }

        let sheet_error = |source| CompileError::Sheet {
            sheet: desc.sheet.clone(),
            source,
        };
        let mut doc = SheetParser::new(desc, &self.ctx)
            .build(main.as_ref(), &mergers)
            .map_err(sheet_error)?;

        for patch_name in &desc.patches {
            // A patch sheet may declare its own header, as long as it builds
            // the same message.
            let patch_desc = self
                .schema
                .sheet(patch_name)
                .filter(|p| p.message.name == desc.message.name)
                .map_or(desc, |p| p.as_ref());
            let table = self.workbook.require(patch_name)?;
            let patch = SheetParser::new(patch_desc, &self.ctx)
                .build(table.as_ref(), &[])
                .map_err(|source| CompileError::Sheet {
                    sheet: patch_name.clone(),
                    source,
                })?;
            merge_document(&mut doc, &patch);
        }

        #[cfg(feature = "tracing")]
        tracing::info!(present = doc.present, "compiled sheet");
        Ok(doc)
    }

    /// Build every entry sheet. Failures do not stop the batch; outcomes keep
    /// manifest order.
    pub fn compile_all(&self) -> Vec<SheetOutcome> {
        let sheets = self.entry_sheets();
        let run = |desc: &&SheetDescriptor| SheetOutcome {
            sheet: desc.sheet.clone(),
            result: self.compile(desc),
        };
        if self.options.parallel {
            sheets.par_iter().map(run).collect()
        } else {
            sheets.iter().map(run).collect()
        }
    }
}
