//! Parsing of rule tables and offline pathway gene dumps
//!
//! Both formats are tab separated text files. Lines starting with `#`
//! are comments.

/// Module to parse annotation rule tables
///
/// ```text
/// #kind       key     category / value                    weight
/// prefix      NDUF    mitochondrial-energy-metabolism     1.0
/// gene        HTT     proteostasis                        0.9
/// literature  HTT     1450
/// ```
///
/// The weight column is optional and defaults to `1.0`
pub(crate) mod rule_table {
    use tracing::error;

    use crate::annotator::RuleTable;
    use crate::category::{CategoryMembership, FunctionalCategory};
    use crate::{PathMechError, PathMechResult};

    fn membership(category: &str, weight: Option<&str>) -> PathMechResult<CategoryMembership> {
        let category: FunctionalCategory = category.parse()?;
        let weight = match weight.map(str::trim) {
            None | Some("") => 1.0,
            Some(weight) => weight.parse::<f64>().map_err(|_| {
                PathMechError::InvalidConfiguration(format!("invalid weight {weight}"))
            })?,
        };
        CategoryMembership::new(category, weight)
    }

    /// Parses a single rule line and adds it to the table
    fn rule_line(line: &str, rules: &mut RuleTable) -> PathMechResult<()> {
        let mut cols = line.split('\t');

        // Column 1 is the kind of rule
        let Some(kind) = cols.next() else {
            return Err(PathMechError::InvalidInput(line.to_string()));
        };

        // Column 2 is the gene symbol, gene ID or symbol prefix
        let Some(key) = cols.next() else {
            return Err(PathMechError::InvalidInput(line.to_string()));
        };

        // Column 3 is the category or the literature value
        let Some(value) = cols.next() else {
            return Err(PathMechError::InvalidInput(line.to_string()));
        };

        match kind.trim() {
            "prefix" => rules.add_prefix(key, membership(value, cols.next())?),
            "gene" => rules.add_override(key, membership(value, cols.next())?)?,
            "literature" => {
                let value = value.trim().parse::<f64>().map_err(|_| {
                    PathMechError::InvalidConfiguration(format!(
                        "invalid literature value {value}"
                    ))
                })?;
                rules.set_literature(key, value)?;
            }
            other => {
                error!("Unknown rule kind {}", other);
                return Err(PathMechError::InvalidInput(line.to_string()));
            }
        }
        Ok(())
    }

    pub fn parse(content: &str) -> PathMechResult<RuleTable> {
        let mut rules = RuleTable::new();
        for line in content.lines() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            rule_line(line, &mut rules).map_err(|err| {
                error!("Invalid rule: {}", line);
                err
            })?;
        }
        Ok(rules)
    }

    #[cfg(test)]
    mod test {
        use super::*;
        use crate::annotator::FunctionalAnnotator;
        use crate::Gene;

        #[test]
        fn parse_all_kinds() {
            let content = "#kind\tkey\tvalue\tweight\n\
                prefix\tNDUF\tmitochondrial-energy-metabolism\t1.0\n\
                \n\
                gene\tHTT\tproteostasis\t0.9\n\
                gene\tHTT\texcitotoxicity\n\
                literature\tHTT\t1450\n";
            let rules = parse(content).unwrap();
            assert_eq!(rules.len(), 4);

            let annotator = FunctionalAnnotator::new(&rules);
            let htt = annotator.annotate(&Gene::new(3064u32.into(), "HTT"));
            assert_eq!(
                htt.memberships().weight(FunctionalCategory::Proteostasis),
                Some(0.9)
            );
            assert_eq!(
                htt.memberships().weight(FunctionalCategory::Excitotoxicity),
                Some(1.0)
            );
            assert!((htt.literature() - 1450.0).abs() < f64::EPSILON);
        }

        #[test]
        fn unknown_category() {
            let err = parse("prefix\tFOO\tferroptosis\t1.0\n").unwrap_err();
            assert_eq!(err, PathMechError::UnknownCategory("ferroptosis".to_string()));
        }

        #[test]
        fn weight_out_of_range() {
            assert!(matches!(
                parse("gene\tHTT\tproteostasis\t1.5\n"),
                Err(PathMechError::InvalidConfiguration(_))
            ));
            assert!(matches!(
                parse("gene\tHTT\tproteostasis\tabc\n"),
                Err(PathMechError::InvalidConfiguration(_))
            ));
        }

        #[test]
        fn malformed_lines() {
            assert!(matches!(
                parse("gene\tHTT\n"),
                Err(PathMechError::InvalidInput(_))
            ));
            assert!(matches!(
                parse("regex\tHT*\tproteostasis\n"),
                Err(PathMechError::InvalidInput(_))
            ));
        }
    }
}

/// Module to parse offline dumps of pathway gene records
///
/// ```text
/// disease_id  gene_id     symbol  pathway_id
/// hsa05016    hsa:3064    HTT     hsa05016
/// hsa05016    hsa:627     BDNF    hsa05016
/// ```
pub(crate) mod gene_records {
    use std::collections::BTreeMap;

    use crate::annotations::DiseaseId;
    use crate::source::GeneRecord;
    use crate::{PathMechError, PathMechResult};

    /// Checks the first (header) line
    fn check_header(line: Option<&str>) -> PathMechResult<()> {
        match line {
            Some(header) if header.starts_with('#') || header.starts_with("disease_id") => Ok(()),
            _ => Err(PathMechError::InvalidInput(
                "pathway gene file must contain a header".to_string(),
            )),
        }
    }

    /// Parses a single record line
    fn record_line(line: &str) -> PathMechResult<(DiseaseId, GeneRecord)> {
        let mut cols = line.split('\t');

        let Some(disease) = cols.next() else {
            return Err(PathMechError::InvalidInput(line.to_string()));
        };
        let Some(gene_id) = cols.next() else {
            return Err(PathMechError::InvalidInput(line.to_string()));
        };
        let Some(symbol) = cols.next() else {
            return Err(PathMechError::InvalidInput(line.to_string()));
        };
        let Some(pathway_id) = cols.next() else {
            return Err(PathMechError::InvalidInput(line.to_string()));
        };

        Ok((
            DiseaseId::try_from(disease)?,
            GeneRecord::new(gene_id.trim(), symbol.trim(), pathway_id.trim()),
        ))
    }

    pub fn parse(content: &str) -> PathMechResult<BTreeMap<DiseaseId, Vec<GeneRecord>>> {
        let mut lines = content.lines();
        check_header(lines.next())?;

        let mut records: BTreeMap<DiseaseId, Vec<GeneRecord>> = BTreeMap::new();
        for line in lines {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (disease, record) = record_line(line)?;
            records.entry(disease).or_default().push(record);
        }
        Ok(records)
    }

    #[cfg(test)]
    mod test {
        use super::*;

        #[test]
        fn parse_records() {
            let content = "disease_id\tgene_id\tsymbol\tpathway_id\n\
                hsa05016\thsa:3064\tHTT\thsa05016\n\
                hsa05016\thsa:627\tBDNF\thsa05016\n\
                hsa05010\thsa:351\tAPP\thsa05010\n";
            let records = parse(content).unwrap();
            assert_eq!(records.len(), 2);

            let hd = &records[&DiseaseId::from(5016u32)];
            assert_eq!(hd.len(), 2);
            assert_eq!(hd[0].symbol(), "HTT");
            assert_eq!(hd[1].gene_id(), "hsa:627");
        }

        #[test]
        fn missing_header() {
            assert!(parse("hsa05016\thsa:3064\tHTT\thsa05016\n").is_err());
            assert!(parse("").is_err());
        }

        #[test]
        fn missing_columns() {
            let content = "#disease\tgene\tsymbol\tpathway\nhsa05016\thsa:3064\tHTT\n";
            assert!(matches!(parse(content), Err(PathMechError::InvalidInput(_))));
        }
    }
}
