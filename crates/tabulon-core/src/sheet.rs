//! Drives the builder over every data row of a sheet.

use tabulon_common::{Table, Transposed};
use tabulon_spec::SheetDescriptor;

use crate::builder::Parser;
use crate::codec::Locale;
use crate::columns::ColumnIndex;
use crate::context::BuildContext;
use crate::cursor::RowCells;
use crate::error::ParseError;
use crate::options::SheetDefaults;
use crate::value::{Document, Message};

pub struct SheetParser<'a> {
    sheet: &'a SheetDescriptor,
    ctx: BuildContext,
    defaults: SheetDefaults,
}

impl<'a> SheetParser<'a> {
    /// A sheet time zone overrides the locale of `ctx`.
    pub fn new(sheet: &'a SheetDescriptor, ctx: &BuildContext) -> Self {
        let mut ctx = ctx.clone();
        if let Some(locale) = Locale::from_timezone(&sheet.timezone) {
            ctx.locale = locale;
        }
        Self {
            sheet,
            ctx,
            defaults: SheetDefaults::from(sheet),
        }
    }

    pub fn descriptor(&self) -> &SheetDescriptor {
        self.sheet
    }

    /// Parse every data row of `table` into `root`. Returns whether any row
    /// populated a field.
    pub fn parse_table(&self, table: &dyn Table, root: &mut Message) -> Result<bool, ParseError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "parse_table",
            sheet = %self.sheet.sheet,
            table = table.name(),
            transpose = self.sheet.transpose
        )
        .entered();

        if self.sheet.transpose {
            self.parse_rows(&Transposed::new(table), root, true)
        } else {
            self.parse_rows(table, root, false)
        }
    }

    fn parse_rows(
        &self,
        table: &dyn Table,
        root: &mut Message,
        transposed: bool,
    ) -> Result<bool, ParseError> {
        let index = ColumnIndex::resolve(table, &self.sheet.header, transposed)?;
        let parser = Parser::new(&self.ctx, &self.defaults);
        let first = self.sheet.header.datarow.saturating_sub(1) as usize;

        let mut present = false;
        let mut prev: Option<RowCells<'_>> = None;
        for row in first..table.row_count() {
            let cells = RowCells::build(table.name(), row, &index, table, prev.as_ref(), transposed)?;
            present |= parser.parse_message(&self.sheet.message, root, &cells, "")?;
            prev = Some(cells);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rows = table.row_count().saturating_sub(first),
            columns = index.len(),
            present,
            "parsed table"
        );
        Ok(present)
    }

    /// Build the sheet's document from its main table followed by its merger
    /// tables, all parsed into one root.
    pub fn build(&self, main: &dyn Table, mergers: &[&dyn Table]) -> Result<Document, ParseError> {
        let mut doc = Document::new(self.sheet.sheet.clone(), self.sheet.message.clone());
        doc.present = self.parse_table(main, &mut doc.root)?;
        for table in mergers {
            let present = self.parse_table(*table, &mut doc.root)?;
            doc.present |= present;
        }
        Ok(doc)
    }
}
