mod basic_rules;
