mod sailor;
