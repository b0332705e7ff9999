//! Record Decoder - Streams typed records out of a delimited text source

use crate::error::{Result, TrendError};
use crate::record::SocialMediaPost;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;

/// Streaming decoder from CSV text to [`SocialMediaPost`] records.
///
/// Columns are mapped to fields by header name, not position. The four count
/// columns (`Views`, `Likes`, `Shares`, `Comments`) are coerced to integers;
/// a row whose count column is non-numeric or negative yields a per-row
/// [`TrendError::Decode`] without stopping the iterator. An I/O failure on
/// the underlying source terminates the sequence after yielding the error.
pub struct RecordDecoder<R: Read> {
    reader: csv::Reader<R>,
    header_index: HashMap<String, usize>,
    row: u64,
    done: bool,
}

impl<R: Read> RecordDecoder<R> {
    /// Create a decoder over a readable CSV source with a header row.
    pub fn new(source: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let header_index = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect::<HashMap<_, _>>();

        Ok(Self {
            reader,
            header_index,
            row: 0,
            done: false,
        })
    }

    fn field<'a>(&self, record: &'a StringRecord, column: &str) -> Result<&'a str> {
        self.header_index
            .get(column)
            .and_then(|&idx| record.get(idx))
            .ok_or_else(|| TrendError::Decode {
                row: self.row,
                column: column.to_string(),
                message: "value is missing".to_string(),
            })
    }

    fn text_field(&self, record: &StringRecord, column: &str) -> Result<String> {
        self.field(record, column).map(|s| s.to_string())
    }

    fn count_field(&self, record: &StringRecord, column: &str) -> Result<i64> {
        let raw = self.field(record, column)?;
        let value = raw.trim().parse::<i64>().map_err(|_| TrendError::Decode {
            row: self.row,
            column: column.to_string(),
            message: format!("expected an integer, got '{}'", raw),
        })?;
        if value < 0 {
            return Err(TrendError::Decode {
                row: self.row,
                column: column.to_string(),
                message: format!("expected a non-negative integer, got {}", value),
            });
        }
        Ok(value)
    }

    fn decode_row(&self, record: &StringRecord) -> Result<SocialMediaPost> {
        Ok(SocialMediaPost {
            post_id: self.text_field(record, "Post_ID")?,
            platform: self.text_field(record, "Platform")?,
            hashtag: self.text_field(record, "Hashtag")?,
            content_type: self.text_field(record, "Content_Type")?,
            region: self.text_field(record, "Region")?,
            views: self.count_field(record, "Views")?,
            likes: self.count_field(record, "Likes")?,
            shares: self.count_field(record, "Shares")?,
            comments: self.count_field(record, "Comments")?,
            engagement_level: self.text_field(record, "Engagement_Level")?,
            post_date: self.text_field(record, "Post_Date")?,
        })
    }
}

impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = Result<SocialMediaPost>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut record = StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => {
                self.row += 1;
                Some(self.decode_row(&record))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                // Source-level read failure: yield it once, then end the sequence.
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}
