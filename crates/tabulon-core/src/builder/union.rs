use smallvec::SmallVec;
use tabulon_spec::{FieldDescriptor, FieldKind, UnionDescriptor, UnionVariant};

use super::Parser;
use crate::cursor::RowCells;
use crate::error::{ErrorKind, FieldFrame, ParseError, ResultExt};
use crate::options::FieldOptions;
use crate::value::{Message, UnionValue, Value};

impl Parser<'_> {
    /// Discriminator in `{Name}{Type}`, payload fields in numbered cells
    /// `{Name}{Field}1`, `{Name}{Field}2`, ... A zero or blank discriminator
    /// leaves the union unset.
    pub(super) fn parse_union_field(
        &self,
        field: &FieldDescriptor,
        union: &UnionDescriptor,
        opts: &FieldOptions,
        msg: &mut Message,
        row: &RowCells<'_>,
        prefix: &str,
    ) -> Result<bool, ParseError> {
        if msg.has(field.number) {
            return Ok(true);
        }
        let base = format!("{prefix}{}", opts.name);
        let type_column = format!("{base}{}", union.type_field);
        let cell = row.cell(&type_column, opts.optional)?;
        let text = cell.data.trim();
        if text.is_empty() {
            return Ok(false);
        }
        let unknown = || ErrorKind::UnknownUnionDiscriminator {
            union: union.name.clone(),
            value: text.to_string(),
        };
        let discriminator = union
            .discriminator
            .lookup(text)
            .ok_or_else(unknown)
            .at(|| row.context(&type_column))?
            .number;
        if discriminator == 0 {
            return Ok(false);
        }
        let variant = union
            .variant(discriminator)
            .ok_or_else(unknown)
            .at(|| row.context(&type_column))?;

        let payload = self.parse_payload(variant, opts, row, &format!("{base}{}", union.value_field))?;
        msg.set(
            field.number,
            Value::Union(UnionValue {
                discriminator,
                payload,
            }),
        );
        Ok(true)
    }

    /// Fields are read in declaration order. A field taking `cells` cells
    /// shifts every later field by `cells - 1`.
    fn parse_payload(
        &self,
        variant: &UnionVariant,
        union_opts: &FieldOptions,
        row: &RowCells<'_>,
        stem: &str,
    ) -> Result<Message, ParseError> {
        let desc = &variant.message;
        let mut payload = Message::new();
        let mut shift = 0usize;
        for field in &desc.fields {
            let opts = self.options(field);
            let first = field.number as usize + shift;
            shift += opts.prop.cells - 1;
            let first_column = format!("{stem}{first}");

            let mut texts: SmallVec<[&str; 4]> = SmallVec::new();
            for position in first..first + opts.prop.cells {
                let column = format!("{stem}{position}");
                let cell = row.cell(&column, opts.optional || union_opts.optional)?;
                if !cell.is_blank() {
                    texts.push(cell.data.trim());
                }
            }
            let text = texts.join(&opts.sep);

            self.payload_field(field, &opts, &mut payload, &text)
                .at(|| row.context(&first_column))
                .map_err(|err| {
                    err.with_frame(FieldFrame {
                        type_name: desc.name.clone(),
                        field: field.name.clone(),
                        options: opts.to_string(),
                    })
                })?;
        }
        Ok(payload)
    }

    /// A payload field is parsed from text as if it spanned one cell.
    fn payload_field(
        &self,
        field: &FieldDescriptor,
        opts: &FieldOptions,
        payload: &mut Message,
        text: &str,
    ) -> Result<(), ErrorKind> {
        let (value, present) = match &field.kind {
            FieldKind::Scalar(kind) => self.text_scalar(kind, opts, text)?,
            FieldKind::Message(desc) => {
                let mut value = Message::new();
                let present = self.incell_message(desc, &mut value, text, &opts.sep)?;
                (Value::Message(value), present)
            }
            FieldKind::List(elem) => {
                let items = self.incell_list(elem, opts, text)?;
                let present = !items.is_empty();
                (Value::List(items), present)
            }
            FieldKind::Map { key, value } => {
                let entries = self.incell_map(key, value, opts, text)?;
                let present = !entries.is_empty();
                (Value::Map(entries), present)
            }
            FieldKind::Union(inner) => {
                return Err(ErrorKind::unsupported(format!(
                    "union `{}` nested in a union payload",
                    inner.name
                )));
            }
        };
        super::store(payload, field.number, value, present);
        Ok(())
    }
}
