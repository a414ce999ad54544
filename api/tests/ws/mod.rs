mod mux_test;
