mod mythcraft;
