pub(crate) mod retry_401_failure;
