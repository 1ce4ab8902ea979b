/// Joins a perfdata label and its fields into `label=value;warn;crit`, dropping trailing empty
/// fields.
macro_rules! metric_string {
    ($name:expr, $( $fields:expr ), *) => {
        {
            let mut s = String::new();
            s.push_str(&format!("{}=", $name));
            $(
                s.push_str(&$fields);
                s.push(';');
            )*
            s.trim_end_matches(';').to_string()
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_metric_string_macro() {
        let empty = String::new();
        assert_eq!(metric_string!("load", "1.50".to_owned(), empty, empty), "load=1.50");
        assert_eq!(
            metric_string!("load", "1.50".to_owned(), empty, "20".to_owned()),
            "load=1.50;;20"
        );
    }
}
