use crate::domain::bank::Bank;
use crate::error::Result;
use std::io::Write;

/// Writes a bank rate table as CSV, in the same layout `BankReader` reads.
pub struct BankWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BankWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_banks<'a>(&mut self, banks: impl IntoIterator<Item = &'a Bank>) -> Result<()> {
        for bank in banks {
            self.writer.serialize(bank)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bank::default_banks;
    use crate::interfaces::csv::bank_reader::BankReader;

    #[test]
    fn test_writes_header_and_labels() {
        let mut out = Vec::new();
        BankWriter::new(&mut out)
            .write_banks(default_banks().iter())
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,name,short_name,logo,rate,bonus,color")
        );
        assert_eq!(lines.next(), Some("cbe,CBE,CBE,cbe,164.6,10 ETB,#2E7D32"));
        assert!(text.contains("awash,Awash,Awash,awash,154.9,2%,#1565C0"));
    }

    #[test]
    fn test_output_reads_back() {
        let mut out = Vec::new();
        BankWriter::new(&mut out)
            .write_banks(default_banks().iter())
            .unwrap();
        let table = BankReader::new(out.as_slice()).into_table().unwrap();
        assert_eq!(&*table, &*default_banks());
    }
}
