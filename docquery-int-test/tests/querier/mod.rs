mod composite_id_test;
mod querier_test;
