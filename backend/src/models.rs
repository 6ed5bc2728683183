use serde::Serialize;
use serde_json::{json, Map, Number, Value};

pub const WELCOME_MESSAGE: &str = "Welcome to the Loan Approval Prediction API!";

/// Number of columns the classifier expects.
pub const FEATURE_COUNT: usize = 11;

/// Column order of the feature vector. The first three are integer-encoded,
/// the rest are pre-normalized continuous values.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "no_of_dependents",
    "education",
    "self_employed",
    "income_annum",
    "loan_amount",
    "loan_term",
    "cibil_score",
    "residential_assets_value",
    "commercial_assets_value",
    "luxury_assets_value",
    "bank_asset_value",
];

const INTEGER_FIELDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanApplication {
    pub no_of_dependents: i64,
    /// 1 for graduate, 0 otherwise.
    pub education: i64,
    /// 1 for self-employed, 0 otherwise.
    pub self_employed: i64,
    pub income_annum: f64,
    pub loan_amount: f64,
    pub loan_term: f64,
    pub cibil_score: f64,
    pub residential_assets_value: f64,
    pub commercial_assets_value: f64,
    pub luxury_assets_value: f64,
    pub bank_asset_value: f64,
}

impl LoanApplication {
    /// Coerces a decoded request body into an application.
    ///
    /// Every field is checked, so the error list names all offending fields
    /// in column order rather than stopping at the first one. Extra keys are
    /// ignored.
    pub fn from_json(body: &Value) -> Result<Self, Vec<FieldError>> {
        let Some(fields) = body.as_object() else {
            return Err(vec![FieldError::not_an_object()]);
        };

        let mut errors = Vec::new();
        let mut ints = [0i64; INTEGER_FIELDS];
        let mut floats = [0f64; FEATURE_COUNT - INTEGER_FIELDS];

        for (slot, name) in ints.iter_mut().zip(&FEATURE_NAMES[..INTEGER_FIELDS]) {
            match coerce_int(fields, *name) {
                Ok(value) => *slot = value,
                Err(err) => errors.push(err),
            }
        }
        for (slot, name) in floats.iter_mut().zip(&FEATURE_NAMES[INTEGER_FIELDS..]) {
            match coerce_float(fields, *name) {
                Ok(value) => *slot = value,
                Err(err) => errors.push(err),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let [no_of_dependents, education, self_employed] = ints;
        let [
            income_annum,
            loan_amount,
            loan_term,
            cibil_score,
            residential_assets_value,
            commercial_assets_value,
            luxury_assets_value,
            bank_asset_value,
        ] = floats;

        Ok(LoanApplication {
            no_of_dependents,
            education,
            self_employed,
            income_annum,
            loan_amount,
            loan_term,
            cibil_score,
            residential_assets_value,
            commercial_assets_value,
            luxury_assets_value,
            bank_asset_value,
        })
    }

    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        [
            self.no_of_dependents as f32,
            self.education as f32,
            self.self_employed as f32,
            self.income_annum as f32,
            self.loan_amount as f32,
            self.loan_term as f32,
            self.cibil_score as f32,
            self.residential_assets_value as f32,
            self.commercial_assets_value as f32,
            self.luxury_assets_value as f32,
            self.bank_asset_value as f32,
        ]
    }
}

fn coerce_int(fields: &Map<String, Value>, name: &'static str) -> Result<i64, FieldError> {
    match fields.get(name) {
        None => Err(FieldError::missing(name)),
        Some(Value::Number(number)) => int_from_number(number, name),
        Some(Value::String(text)) => {
            let text = text.trim();
            if let Ok(value) = text.parse::<i64>() {
                return Ok(value);
            }
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() && value.fract() == 0.0 => {
                    int_from_f64(value, name)
                }
                _ => Err(FieldError::new(
                    "int_parsing",
                    name,
                    "Input should be a valid integer, unable to parse string as an integer",
                )),
            }
        }
        Some(_) => Err(FieldError::int_type(name)),
    }
}

fn int_from_number(number: &Number, name: &'static str) -> Result<i64, FieldError> {
    if let Some(value) = number.as_i64() {
        return Ok(value);
    }
    match number.as_f64() {
        Some(value) if value.fract() != 0.0 => Err(FieldError::new(
            "int_from_float",
            name,
            "Input should be a valid integer, got a number with a fractional part",
        )),
        Some(value) => int_from_f64(value, name),
        None => Err(FieldError::int_type(name)),
    }
}

fn int_from_f64(value: f64, name: &'static str) -> Result<i64, FieldError> {
    if value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(FieldError::new(
            "int_parsing_size",
            name,
            "Input should be a valid integer, unable to parse input as an integer: value too large",
        ))
    }
}

fn coerce_float(fields: &Map<String, Value>, name: &'static str) -> Result<f64, FieldError> {
    let value = match fields.get(name) {
        None => return Err(FieldError::missing(name)),
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| FieldError::float_type(name))?,
        Some(Value::String(text)) => text.trim().parse::<f64>().map_err(|_| {
            FieldError::new(
                "float_parsing",
                name,
                "Input should be a valid number, unable to parse string as a number",
            )
        })?,
        Some(_) => return Err(FieldError::float_type(name)),
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(FieldError::new("finite_number", name, "Input should be a finite number"))
    }
}

/// One entry of a 422 response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub loc: Vec<Value>,
    pub msg: String,
}

impl FieldError {
    pub fn new(kind: &'static str, field: &str, msg: &str) -> Self {
        FieldError {
            kind,
            loc: vec![json!("body"), json!(field)],
            msg: msg.to_string(),
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::new("missing", field, "Field required")
    }

    fn int_type(field: &str) -> Self {
        Self::new("int_type", field, "Input should be a valid integer")
    }

    fn float_type(field: &str) -> Self {
        Self::new("float_type", field, "Input should be a valid number")
    }

    pub fn not_an_object() -> Self {
        FieldError {
            kind: "model_attributes_type",
            loc: vec![json!("body")],
            msg: "Input should be a valid dictionary or object to extract fields from".into(),
        }
    }

    /// Body that could not be decoded at all; `position` is the column the
    /// decoder stopped at, when known.
    pub fn json_invalid(position: Option<usize>, reason: impl Into<String>) -> Self {
        let mut loc = vec![json!("body")];
        if let Some(position) = position {
            loc.push(json!(position));
        }
        FieldError {
            kind: "json_invalid",
            loc,
            msg: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoanStatus {
    Approved,
    Rejected,
}

impl LoanStatus {
    /// Only an exact positive class label approves.
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            LoanStatus::Approved
        } else {
            LoanStatus::Rejected
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictionResult {
    pub loan_status: LoanStatus,
}

#[derive(Debug, Serialize)]
pub struct WelcomeMessage {
    pub message: &'static str,
}

impl Default for WelcomeMessage {
    fn default() -> Self {
        WelcomeMessage { message: WELCOME_MESSAGE }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Value {
        json!({
            "no_of_dependents": 2,
            "education": 1,
            "self_employed": 0,
            "income_annum": 90000,
            "loan_amount": 300000,
            "loan_term": 12,
            "cibil_score": 750,
            "residential_assets_value": 500000,
            "commercial_assets_value": 0,
            "luxury_assets_value": 100000,
            "bank_asset_value": 200000
        })
    }

    #[test]
    fn parses_scenario_in_column_order() {
        let application = LoanApplication::from_json(&scenario()).unwrap();
        assert_eq!(
            application.to_array(),
            [2.0, 1.0, 0.0, 90000.0, 300000.0, 12.0, 750.0, 500000.0, 0.0, 100000.0, 200000.0]
        );
    }

    #[test]
    fn feature_names_match_column_order() {
        let mut body = scenario();
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            body[*name] = json!(i as f64);
        }
        let application = LoanApplication::from_json(&body).unwrap();
        let expected: Vec<f32> = (0..FEATURE_COUNT).map(|i| i as f32).collect();
        assert_eq!(application.to_array().to_vec(), expected);
    }

    #[test]
    fn coerces_numeric_strings() {
        let mut body = scenario();
        body["no_of_dependents"] = json!("3");
        body["cibil_score"] = json!(" 0.42 ");
        body["education"] = json!(1.0);
        let application = LoanApplication::from_json(&body).unwrap();
        assert_eq!(application.no_of_dependents, 3);
        assert_eq!(application.education, 1);
        assert!((application.cibil_score - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn ignores_unknown_fields() {
        let mut body = scenario();
        body["applicant_name"] = json!("someone");
        assert!(LoanApplication::from_json(&body).is_ok());
    }

    #[test]
    fn reports_missing_field() {
        let mut body = scenario();
        body.as_object_mut().unwrap().remove("cibil_score");
        let errors = LoanApplication::from_json(&body).unwrap_err();
        assert_eq!(errors, vec![FieldError::missing("cibil_score")]);
        assert_eq!(errors[0].loc, vec![json!("body"), json!("cibil_score")]);
    }

    #[test]
    fn reports_every_bad_field_in_order() {
        let mut body = scenario();
        body["education"] = json!(0.5);
        body["loan_amount"] = json!("lots");
        body["bank_asset_value"] = json!(null);
        body["self_employed"] = json!(true);
        let kinds: Vec<_> = LoanApplication::from_json(&body)
            .unwrap_err()
            .into_iter()
            .map(|e| (e.kind, e.loc[1].clone()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("int_from_float", json!("education")),
                ("int_type", json!("self_employed")),
                ("float_parsing", json!("loan_amount")),
                ("float_type", json!("bank_asset_value")),
            ]
        );
    }

    #[test]
    fn rejects_non_finite_strings() {
        let mut body = scenario();
        body["income_annum"] = json!("NaN");
        let errors = LoanApplication::from_json(&body).unwrap_err();
        assert_eq!(errors[0].kind, "finite_number");
    }

    #[test]
    fn rejects_non_object_body() {
        let errors = LoanApplication::from_json(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(errors, vec![FieldError::not_an_object()]);
    }

    #[test]
    fn negative_values_pass_through() {
        let mut body = scenario();
        body["loan_amount"] = json!(-1.5);
        let application = LoanApplication::from_json(&body).unwrap();
        assert_eq!(application.loan_amount, -1.5);
    }

    #[test]
    fn maps_labels_to_status() {
        assert_eq!(LoanStatus::from_label(1), LoanStatus::Approved);
        assert_eq!(LoanStatus::from_label(0), LoanStatus::Rejected);
        assert_eq!(LoanStatus::from_label(2), LoanStatus::Rejected);
        assert_eq!(
            serde_json::to_value(PredictionResult { loan_status: LoanStatus::Approved }).unwrap(),
            json!({"loan_status": "Approved"})
        );
    }
}
