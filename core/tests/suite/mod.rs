mod chat_flow;
