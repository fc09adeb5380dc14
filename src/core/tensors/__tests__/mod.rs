mod tensor_test;
