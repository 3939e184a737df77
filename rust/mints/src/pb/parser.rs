use super::PbParseError;
use crate::{ConstraintProto, Expr, Model, VariableID};
use fnv::FnvHashMap;

type Result<T> = std::result::Result<T, PbParseError>;

/// Side information from a WBO header that is not part of the model proper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PbMetadata {
    /// `soft: k ;` top cost, if present.
    pub top_cost: Option<f64>,
    /// Number of auxiliary product variables introduced by linearization.
    pub number_of_products: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    GreaterEqual,
    Equal,
    LessEqual,
}

/// One parsed term: an integer weight times a product of one or more binary
/// variables.
#[derive(Debug, Clone)]
struct Term {
    weight: f64,
    variables: Vec<String>,
}

struct Builder {
    file: String,
    model: Model,
    products: FnvHashMap<Vec<String>, VariableID>,
    metadata: PbMetadata,
    constraint_count: usize,
}

impl Builder {
    fn variable(&mut self, name: &str) -> VariableID {
        match self.model.variable_id_by_name(name) {
            Some(id) => id,
            None => self
                .model
                .create_variable(name, 0, 1)
                .expect("fresh binary variable"),
        }
    }

    /// Auxiliary `z = x_1 /\ ... /\ x_n` with linking constraints; reused for
    /// identical products.
    fn product_variable(&mut self, mut names: Vec<String>) -> VariableID {
        names.sort();
        names.dedup();
        if names.len() == 1 {
            return self.variable(&names[0]);
        }
        if let Some(&id) = self.products.get(&names) {
            return id;
        }
        let members: Vec<VariableID> = names.iter().map(|name| self.variable(name)).collect();
        let product_name = format!("p({})", names.join("*"));
        let product = self
            .model
            .create_variable(&product_name, 0, 1)
            .expect("fresh product variable");
        for (index, &member) in members.iter().enumerate() {
            // z <= x_i
            self.model
                .add_constraint(
                    &format!("{product_name}_ub{index}"),
                    Expr::var(product).plus_term(member, -1.0).le(0.0),
                )
                .expect("fresh constraint name");
        }
        // z >= sum x_i - (n - 1)
        let mut lower_link = Expr::var(product);
        for &member in &members {
            lower_link = lower_link.plus_term(member, -1.0);
        }
        self.model
            .add_constraint(
                &format!("{product_name}_lb"),
                lower_link.ge(-((members.len() - 1) as f64)),
            )
            .expect("fresh constraint name");
        self.products.insert(names, product);
        self.metadata.number_of_products += 1;
        product
    }

    fn expression(&mut self, terms: Vec<Term>) -> Expr {
        let mut expr = Expr::new();
        for term in terms {
            let id = self.product_variable(term.variables);
            expr = expr.plus_term(id, term.weight);
        }
        expr
    }

    fn add_constraint(&mut self, terms: Vec<Term>, relation: Relation, rhs: f64) {
        let expr = self.expression(terms);
        let proto: ConstraintProto = match relation {
            Relation::GreaterEqual => expr.ge(rhs),
            Relation::Equal => expr.eq(rhs),
            Relation::LessEqual => expr.le(rhs),
        };
        let name = format!("c{}", self.constraint_count);
        self.constraint_count += 1;
        self.model
            .add_constraint(&name, proto)
            .expect("generated constraint names are unique");
    }
}

fn parse_weight(token: &str) -> Option<f64> {
    let token = token.strip_prefix('+').unwrap_or(token);
    token.parse::<f64>().ok()
}

/// Parse OPB/WBO text. Statements end with `;` and may span lines; `*`
/// starts a comment line.
pub fn load_str(file: &str, text: &str) -> Result<(Model, PbMetadata)> {
    let mut builder = Builder {
        file: file.to_string(),
        model: Model::new(file),
        products: Default::default(),
        metadata: PbMetadata::default(),
        constraint_count: 0,
    };

    let mut statement: Vec<String> = Vec::new();
    let mut statement_line = 0usize;
    let mut last_line = 0usize;
    for (index, line) in text.lines().enumerate() {
        last_line = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }
        if statement.is_empty() {
            statement_line = index + 1;
        }
        for token in line.split_whitespace() {
            statement.push(token.to_string());
        }
        while let Some(position) = statement.iter().position(|t| t.ends_with(';')) {
            let mut head: Vec<String> = statement.drain(..=position).collect();
            let tail = head
                .last_mut()
                .expect("nonempty drain")
                .trim_end_matches(';')
                .to_string();
            if tail.is_empty() {
                head.pop();
            } else {
                *head.last_mut().expect("nonempty drain") = tail;
            }
            read_statement(&mut builder, &head, statement_line)?;
            statement_line = index + 1;
        }
    }
    if !statement.is_empty() {
        return Err(PbParseError::UnterminatedStatement {
            file: builder.file,
            line: last_line,
        });
    }

    let metadata = builder.metadata.clone();
    Ok((builder.model, metadata))
}

fn read_statement(builder: &mut Builder, tokens: &[String], line: usize) -> Result<()> {
    if tokens.is_empty() {
        return Ok(());
    }

    // objective and top-cost headers
    if tokens[0] == "min:" || tokens[0] == "max:" {
        let terms = read_terms(builder, &tokens[1..], line)?;
        let expr = builder.expression(terms);
        if tokens[0] == "min:" {
            builder.model.minimize(expr);
        } else {
            builder.model.maximize(expr);
        }
        return Ok(());
    }
    if tokens[0] == "soft:" {
        let token = tokens.get(1).map(|s| s.as_str()).unwrap_or("");
        let value = parse_weight(token).ok_or_else(|| PbParseError::InvalidToken {
            file: builder.file.clone(),
            line,
            token: token.to_string(),
        })?;
        builder.metadata.top_cost = Some(value);
        return Ok(());
    }

    // constraint: terms, relation, right-hand side
    let relation_position = tokens
        .iter()
        .position(|t| t == ">=" || t == "=" || t == "<=")
        .ok_or_else(|| PbParseError::MissingRelation {
            file: builder.file.clone(),
            line,
        })?;
    let relation = match tokens[relation_position].as_str() {
        ">=" => Relation::GreaterEqual,
        "<=" => Relation::LessEqual,
        _ => Relation::Equal,
    };
    let rhs_token = tokens.get(relation_position + 1).map(|s| s.as_str()).unwrap_or("");
    let rhs = parse_weight(rhs_token).ok_or_else(|| PbParseError::InvalidToken {
        file: builder.file.clone(),
        line,
        token: rhs_token.to_string(),
    })?;
    let terms = read_terms(builder, &tokens[..relation_position], line)?;
    builder.add_constraint(terms, relation, rhs);
    Ok(())
}

/// Token run of `weight var...` groups: a numeric token opens a new term and
/// the following variable tokens form its product.
fn read_terms(builder: &Builder, tokens: &[String], line: usize) -> Result<Vec<Term>> {
    let mut terms: Vec<Term> = Vec::new();
    for token in tokens {
        if let Some(weight) = parse_weight(token) {
            terms.push(Term {
                weight,
                variables: Vec::new(),
            });
        } else {
            if !token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '[' || c == ']')
            {
                return Err(PbParseError::InvalidToken {
                    file: builder.file.clone(),
                    line,
                    token: token.clone(),
                });
            }
            let term = terms
                .last_mut()
                .ok_or_else(|| PbParseError::MissingCoefficient {
                    file: builder.file.clone(),
                    line,
                })?;
            term.variables.push(token.clone());
        }
    }
    for term in &terms {
        if term.variables.is_empty() {
            return Err(PbParseError::MissingCoefficient {
                file: builder.file.clone(),
                line,
            });
        }
    }
    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConstraintSense;
    use indoc::indoc;

    #[test]
    fn parses_objective_and_constraints() {
        let text = indoc! {"
            * a small pseudo-Boolean problem
            min: +2 x1 +3 x2 -1 x3 ;
            +1 x1 +1 x2 >= 1 ;
            +2 x1 -3 x3 = 0 ;
        "};
        let (model, metadata) = load_str("small.opb", text).unwrap();
        assert_eq!(model.number_of_variables(), 3);
        assert_eq!(model.number_of_constraints(), 2);
        assert_eq!(metadata.top_cost, None);

        let x1 = model.variable_id_by_name("x1").unwrap();
        assert!(model.variable(x1).sense().is_binary());
        assert_eq!(model.objective().expression().coefficient(x1), 2.0);
        assert_eq!(model.constraints()[0].sense(), ConstraintSense::Greater);
        assert_eq!(model.constraints()[1].sense(), ConstraintSense::Equal);
    }

    #[test]
    fn product_terms_are_linearized() {
        let text = indoc! {"
            min: +1 x1 x2 ;
            +1 x1 x2 +1 x3 >= 1 ;
        "};
        let (model, metadata) = load_str("product.opb", text).unwrap();
        assert_eq!(metadata.number_of_products, 1);
        // x1, x2, x3 plus one auxiliary
        assert_eq!(model.number_of_variables(), 4);
        let product = model.variable_id_by_name("p(x1*x2)").unwrap();
        assert!(model.variable(product).sense().is_binary());
        // two upper links and one lower link, plus the real constraint
        assert_eq!(model.number_of_constraints(), 4);
        // the product is shared between objective and constraint
        assert_eq!(model.objective().expression().coefficient(product), 1.0);
    }

    #[test]
    fn top_cost_line_is_recorded() {
        let text = indoc! {"
            soft: 13 ;
            min: +1 x1 ;
            +1 x1 >= 1 ;
        "};
        let (_, metadata) = load_str("soft.wbo", text).unwrap();
        assert_eq!(metadata.top_cost, Some(13.0));
    }

    #[test]
    fn missing_relation_is_an_error() {
        let text = "min: +1 x1 ;\n+1 x1 1 ;\n";
        assert!(matches!(
            load_str("bad.opb", text),
            Err(PbParseError::MissingRelation { .. })
        ));
    }

    #[test]
    fn unterminated_statement_is_an_error() {
        let text = "min: +1 x1\n";
        assert!(matches!(
            load_str("bad.opb", text),
            Err(PbParseError::UnterminatedStatement { .. })
        ));
    }
}
