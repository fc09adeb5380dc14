mod rewriter_test;
