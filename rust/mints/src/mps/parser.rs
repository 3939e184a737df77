use super::MpsParseError;
use fnv::{FnvHashMap, FnvHashSet};
use indexmap::IndexSet;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

type Result<T> = std::result::Result<T, MpsParseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MpsObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

/// Raw sparse content of an MPS file, before model construction.
///
/// The constraint matrix is kept row-major: `rows[name]` maps column names to
/// coefficients. Column order of first appearance is preserved so variable
/// IDs are stable across loads.
#[derive(Debug, Clone, Default)]
pub struct Mps {
    pub name: String,
    pub objective_sense: MpsObjectiveSense,
    pub objective_name: String,
    pub columns: IndexSet<String>,
    pub objective: FnvHashMap<String, f64>,
    pub rows: FnvHashMap<String, FnvHashMap<String, f64>>,
    pub row_order: Vec<String>,
    pub rhs: FnvHashMap<String, f64>,
    pub lower: FnvHashMap<String, f64>,
    pub upper: FnvHashMap<String, f64>,
    pub integer: FnvHashSet<String>,
    pub binary: FnvHashSet<String>,
    pub continuous: FnvHashSet<String>,
    pub equal: FnvHashSet<String>,
    pub greater: FnvHashSet<String>,
    pub less: FnvHashSet<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Section {
    #[default]
    Name,
    Rows,
    Columns,
    Rhs,
    Ranges,
    Bounds,
    End,
}

/// State machine over the line-oriented sections.
#[derive(Debug, Default)]
struct Reader {
    file: String,
    line: usize,
    section: Section,
    in_integer_block: bool,
    awaiting_objsense: bool,
    mps: Mps,
}

impl Reader {
    fn error_number(&self, field: &str) -> MpsParseError {
        MpsParseError::InvalidNumber {
            file: self.file.clone(),
            line: self.line,
            field: field.to_string(),
        }
    }

    fn number(&self, field: &str) -> Result<f64> {
        field.parse().map_err(|_| self.error_number(field))
    }

    fn read_header(&mut self, line: &str) -> Result<()> {
        if let Some(name) = line.strip_prefix("NAME") {
            self.mps.name = name.trim().to_string();
        } else if let Some(sense) = line.strip_prefix("OBJSENSE") {
            if sense.trim().is_empty() {
                self.awaiting_objsense = true;
                return Ok(());
            }
            self.mps.objective_sense = self.parse_sense(sense.trim())?;
        } else {
            self.section = match line.trim() {
                "ROWS" => Section::Rows,
                "COLUMNS" => Section::Columns,
                "RHS" => Section::Rhs,
                "RANGES" => Section::Ranges,
                "BOUNDS" => Section::Bounds,
                "ENDATA" => Section::End,
                other => {
                    return Err(MpsParseError::InvalidHeader {
                        file: self.file.clone(),
                        line: self.line,
                        header: other.to_string(),
                    })
                }
            };
        }
        Ok(())
    }

    fn parse_sense(&self, field: &str) -> Result<MpsObjectiveSense> {
        match field {
            "MIN" | "MINIMIZE" => Ok(MpsObjectiveSense::Minimize),
            "MAX" | "MAXIMIZE" => Ok(MpsObjectiveSense::Maximize),
            other => Err(MpsParseError::InvalidObjSense {
                file: self.file.clone(),
                line: self.line,
                field: other.to_string(),
            }),
        }
    }

    //           ROWS
    //            type     name
    fn read_row(&mut self, fields: &[&str]) -> Result<()> {
        if fields.len() < 2 {
            return Err(MpsParseError::TruncatedRecord {
                file: self.file.clone(),
                line: self.line,
            });
        }
        let name = fields[1].to_string();
        match fields[0] {
            "N" => {
                if self.mps.objective_name.is_empty() {
                    self.mps.objective_name = name;
                }
                return Ok(());
            }
            "E" => {
                self.mps.equal.insert(name.clone());
            }
            "G" => {
                self.mps.greater.insert(name.clone());
            }
            "L" => {
                self.mps.less.insert(name.clone());
            }
            other => {
                return Err(MpsParseError::InvalidRowType {
                    file: self.file.clone(),
                    line: self.line,
                    field: other.to_string(),
                })
            }
        }
        self.mps.rows.insert(name.clone(), Default::default());
        self.mps.row_order.push(name);
        Ok(())
    }

    //           COLUMNS
    //                    column      row       value     row       value
    fn read_column(&mut self, fields: &[&str]) -> Result<()> {
        // INTORG/INTEND markers bracket the integer columns
        if fields.len() >= 3 && fields[1] == "'MARKER'" {
            match *fields.last().expect("length checked") {
                "'INTORG'" => self.in_integer_block = true,
                "'INTEND'" => self.in_integer_block = false,
                other => {
                    return Err(MpsParseError::InvalidMarker {
                        file: self.file.clone(),
                        line: self.line,
                        field: other.to_string(),
                    })
                }
            }
            return Ok(());
        }
        if fields.len() < 3 || fields.len() % 2 == 0 {
            return Err(MpsParseError::TruncatedRecord {
                file: self.file.clone(),
                line: self.line,
            });
        }

        let column = fields[0].to_string();
        self.mps.columns.insert(column.clone());
        if self.in_integer_block {
            self.mps.integer.insert(column.clone());
        } else {
            self.mps.continuous.insert(column.clone());
        }

        for pair in fields[1..].chunks(2) {
            let row = pair[0];
            let coefficient = self.number(pair[1])?;
            if row == self.mps.objective_name {
                self.mps.objective.insert(column.clone(), coefficient);
            } else {
                self.mps
                    .rows
                    .get_mut(row)
                    .ok_or_else(|| MpsParseError::UnknownRowName {
                        file: self.file.clone(),
                        line: self.line,
                        name: row.to_string(),
                    })?
                    .insert(column.clone(), coefficient);
            }
        }
        Ok(())
    }

    //           RHS
    //                    rhs name    row       value     row       value
    fn read_rhs(&mut self, fields: &[&str]) -> Result<()> {
        if fields.len() < 3 {
            return Err(MpsParseError::TruncatedRecord {
                file: self.file.clone(),
                line: self.line,
            });
        }
        for pair in fields[1..].chunks(2) {
            if pair.len() < 2 {
                return Err(MpsParseError::TruncatedRecord {
                    file: self.file.clone(),
                    line: self.line,
                });
            }
            let value = self.number(pair[1])?;
            self.mps.rhs.insert(pair[0].to_string(), value);
        }
        Ok(())
    }

    //           RANGES
    //                    range name  row       value
    //
    // A range `r` on row with right-hand `b` splits it into a two-sided
    // constraint:
    //
    //   row type    sign of r      lower        upper
    //   --------------------------------------------
    //      G         + or -          b         b + |r|
    //      L         + or -       b - |r|         b
    //      E           +             b         b + |r|
    //      E           -          b - |r|         b
    fn read_range(&mut self, fields: &[&str]) -> Result<()> {
        if fields.len() < 3 {
            return Err(MpsParseError::TruncatedRecord {
                file: self.file.clone(),
                line: self.line,
            });
        }
        for pair in fields[1..].chunks(2) {
            if pair.len() < 2 {
                return Err(MpsParseError::TruncatedRecord {
                    file: self.file.clone(),
                    line: self.line,
                });
            }
            let row = pair[0].to_string();
            let range = self.number(pair[1])?;
            if !self.mps.rows.contains_key(&row) {
                return Err(MpsParseError::UnknownRowName {
                    file: self.file.clone(),
                    line: self.line,
                    name: row,
                });
            }
            let mut twin = format!("{row}_");
            while self.mps.rows.contains_key(&twin) {
                twin.push('_');
            }
            let terms = self.mps.rows[&row].clone();
            self.mps.rows.insert(twin.clone(), terms);
            self.mps.row_order.push(twin.clone());
            let base = self.mps.rhs.get(&row).copied().unwrap_or(0.0);

            let twin_rhs = if self.mps.equal.remove(&row) {
                if range > 0.0 {
                    self.mps.greater.insert(row.clone());
                    self.mps.less.insert(twin.clone());
                    base + range.abs()
                } else {
                    self.mps.less.insert(row.clone());
                    self.mps.greater.insert(twin.clone());
                    base - range.abs()
                }
            } else if self.mps.greater.contains(&row) {
                self.mps.less.insert(twin.clone());
                base + range.abs()
            } else if self.mps.less.contains(&row) {
                self.mps.greater.insert(twin.clone());
                base - range.abs()
            } else {
                continue;
            };
            self.mps.rhs.insert(twin, twin_rhs);
        }
        Ok(())
    }

    //           BOUNDS
    //            type    bound name  column    value
    fn read_bound(&mut self, fields: &[&str]) -> Result<()> {
        let need = |n: usize| -> Result<()> {
            if fields.len() < n {
                Err(MpsParseError::TruncatedRecord {
                    file: self.file.clone(),
                    line: self.line,
                })
            } else {
                Ok(())
            }
        };
        match fields[0] {
            "LO" => {
                need(4)?;
                let value = self.number(fields[3])?;
                self.mps.lower.insert(fields[2].to_string(), value);
            }
            "UP" => {
                need(4)?;
                let value = self.number(fields[3])?;
                self.mps.upper.insert(fields[2].to_string(), value);
            }
            "FX" => {
                need(4)?;
                let value = self.number(fields[3])?;
                self.mps.lower.insert(fields[2].to_string(), value);
                self.mps.upper.insert(fields[2].to_string(), value);
            }
            "MI" => {
                need(3)?;
                self.mps
                    .lower
                    .insert(fields[2].to_string(), f64::NEG_INFINITY);
            }
            "BV" => {
                need(3)?;
                let column = fields[2].to_string();
                self.mps.integer.remove(&column);
                self.mps.continuous.remove(&column);
                self.mps.binary.insert(column);
            }
            "FR" | "PL" => {
                need(3)?;
                if fields[0] == "FR" {
                    self.mps
                        .lower
                        .insert(fields[2].to_string(), f64::NEG_INFINITY);
                }
            }
            "UI" => {
                need(4)?;
                let column = fields[2].to_string();
                let value = self.number(fields[3])?;
                self.mps.continuous.remove(&column);
                self.mps.integer.insert(column.clone());
                self.mps.upper.insert(column, value);
            }
            "LI" => {
                need(4)?;
                let column = fields[2].to_string();
                let value = self.number(fields[3])?;
                self.mps.continuous.remove(&column);
                self.mps.integer.insert(column.clone());
                self.mps.lower.insert(column, value);
            }
            other => {
                return Err(MpsParseError::InvalidBoundType {
                    file: self.file.clone(),
                    line: self.line,
                    field: other.to_string(),
                })
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Mps {
        // an integer column confined to [0, 1] is a binary variable
        let promoted: Vec<String> = self
            .mps
            .integer
            .iter()
            .filter(|column| {
                self.mps.upper.get(*column) == Some(&1.0)
                    && self.mps.lower.get(*column).copied().unwrap_or(0.0) == 0.0
            })
            .cloned()
            .collect();
        for column in promoted {
            self.mps.integer.remove(&column);
            self.mps.binary.insert(column);
        }
        self.mps
    }
}

impl Mps {
    /// Read an MPS file from the given path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = path.as_ref().display().to_string();
        let reader = BufReader::new(fs::File::open(&path)?);
        let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
        Self::parse_lines(&file, lines.iter().map(|s| s.as_str()))
    }

    pub fn parse_lines<'a>(
        file: &str,
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<Self> {
        let mut reader = Reader {
            file: file.to_string(),
            ..Default::default()
        };
        for line in lines {
            reader.line += 1;
            if line.trim().is_empty() || line.starts_with('*') {
                continue;
            }
            if !line.starts_with(' ') {
                reader.read_header(line)?;
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if reader.awaiting_objsense {
                reader.mps.objective_sense = reader.parse_sense(fields[0])?;
                reader.awaiting_objsense = false;
                continue;
            }
            match reader.section {
                Section::Rows => reader.read_row(&fields)?,
                Section::Columns => reader.read_column(&fields)?,
                Section::Rhs => reader.read_rhs(&fields)?,
                Section::Ranges => reader.read_range(&fields)?,
                Section::Bounds => reader.read_bound(&fields)?,
                Section::Name => {
                    return Err(MpsParseError::InvalidHeader {
                        file: reader.file.clone(),
                        line: reader.line,
                        header: line.to_string(),
                    })
                }
                Section::End => break,
            }
        }
        Ok(reader.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn parses_the_classic_example() {
        let text = indoc! {"
            * comment line
            NAME          TESTPROB
            ROWS
             N  COST
             L  LIM1
             G  LIM2
             E  MYEQN
            COLUMNS
                MARKER                 'MARKER'                 'INTORG'
                XONE      COST             1   LIM1             1
                XONE      LIM2             1
                YTWO      COST             4   LIM1             1
                YTWO      MYEQN           -1
                ZTHREE    COST             9   LIM2             1
                ZTHREE    MYEQN            1
                MARKER                 'MARKER'                 'INTEND'
            RHS
                RHS1      LIM1             5   LIM2            10
                RHS1      MYEQN            7
            BOUNDS
             UP BND1      XONE             4
             LO BND1      YTWO            -1
             UP BND1      YTWO             1
            ENDATA
        "};
        let mps = Mps::parse_lines("test.mps", text.lines()).unwrap();
        assert_eq!(mps.name, "TESTPROB");
        assert_eq!(mps.objective_name, "COST");
        assert_eq!(mps.columns.len(), 3);
        assert_eq!(mps.objective["ZTHREE"], 9.0);
        assert_eq!(mps.rows["LIM1"]["XONE"], 1.0);
        assert_eq!(mps.rhs["MYEQN"], 7.0);
        assert!(mps.less.contains("LIM1"));
        assert!(mps.greater.contains("LIM2"));
        assert!(mps.equal.contains("MYEQN"));
        assert!(mps.integer.contains("XONE"));
        // YTWO has bounds [-1, 1]: stays integer, not binary
        assert!(mps.integer.contains("YTWO"));
    }

    #[test]
    fn objsense_on_its_own_line() {
        let text = indoc! {"
            NAME Problem
            OBJSENSE
             MAX
            ENDATA
        "};
        let mps = Mps::parse_lines("test.mps", text.lines()).unwrap();
        assert_eq!(mps.objective_sense, MpsObjectiveSense::Maximize);

        let text = indoc! {"
            NAME Problem
            OBJSENSE MIN
            ENDATA
        "};
        let mps = Mps::parse_lines("test.mps", text.lines()).unwrap();
        assert_eq!(mps.objective_sense, MpsObjectiveSense::Minimize);

        let text = indoc! {"
            NAME Problem
            OBJSENSE
             MINMAX
            ENDATA
        "};
        assert!(Mps::parse_lines("test.mps", text.lines()).is_err());
    }

    #[test]
    fn range_splits_an_equality_into_two_rows() {
        let text = indoc! {"
            NAME ranged
            ROWS
             N  OBJ
             E  R1
            COLUMNS
                MARKER                 'MARKER'                 'INTORG'
                X         R1               1   OBJ              1
                MARKER                 'MARKER'                 'INTEND'
            RHS
                RHS       R1               1
            RANGES
                RNG       R1               1
            ENDATA
        "};
        let mps = Mps::parse_lines("test.mps", text.lines()).unwrap();
        assert!(mps.equal.is_empty());
        assert!(mps.greater.contains("R1"));
        assert!(mps.less.contains("R1_"));
        assert_eq!(mps.rhs["R1"], 1.0);
        assert_eq!(mps.rhs["R1_"], 2.0);
    }

    #[test]
    fn errors_carry_file_and_line() {
        let text = "NAME x\nROWS\n Q BAD\n";
        let error = Mps::parse_lines("bad.mps", text.lines()).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("bad.mps:3"), "{message}");
    }
}
